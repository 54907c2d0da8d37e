use super::definition::Workflow;
use crate::error::WorkflowConversionError;

/// A trait for custom data models that can be converted into a Nagare `Workflow`.
///
/// This is the extension point for loading workflows saved by an editor or any
/// other host format. Implement it on your own structs to provide the
/// translation layer, then hand the result to the compiler.
///
/// # Example
///
/// ```rust,no_run
/// use nagare::prelude::*;
/// use nagare::error::WorkflowConversionError;
///
/// struct MyStep { id: String, op: String }
/// struct MyPipeline { steps: Vec<MyStep> }
///
/// impl IntoWorkflow for MyPipeline {
///     fn into_workflow(self) -> std::result::Result<Workflow, WorkflowConversionError> {
///         let mut workflow = Workflow::new("pipeline");
///         let mut previous: Option<String> = None;
///         for step in self.steps {
///             let node = if previous.is_none() {
///                 Node::source(step.id.clone(), step.op)
///             } else {
///                 Node::transform(step.id.clone(), step.op)
///             };
///             workflow.add_node(node)?;
///             if let Some(prev) = previous {
///                 workflow.add_connection(&prev, &step.id)?;
///             }
///             previous = Some(step.id);
///         }
///         Ok(workflow)
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a workflow graph.
    fn into_workflow(self) -> Result<Workflow, WorkflowConversionError>;
}

impl IntoWorkflow for Workflow {
    fn into_workflow(self) -> Result<Workflow, WorkflowConversionError> {
        Ok(self)
    }
}
