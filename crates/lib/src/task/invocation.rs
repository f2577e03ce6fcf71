use std::fmt;

use super::{TaskError, TaskId};

/// A task named on the command line, with optional `name[arg,arg]` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
  pub task: TaskId,
  pub args: Vec<String>,
}

impl TaskInvocation {
  pub fn new(task: TaskId) -> Self {
    Self { task, args: Vec::new() }
  }

  /// Parse `name` or `name[a,b,...]`.
  ///
  /// Arguments are trimmed; empty positions are kept so later arguments stay
  /// in place (`tests:xunit[cmd,asm,out,,4]`).
  pub fn parse(input: &str) -> Result<Self, TaskError> {
    let input = input.trim();
    let (name, args) = match input.find('[') {
      Some(open) => {
        let inner = input[open + 1..]
          .strip_suffix(']')
          .ok_or_else(|| TaskError::InvalidInvocation(input.to_string()))?;
        if inner.contains(['[', ']']) {
          return Err(TaskError::InvalidInvocation(input.to_string()));
        }
        let args = if inner.trim().is_empty() {
          Vec::new()
        } else {
          inner.split(',').map(|a| a.trim().to_string()).collect()
        };
        (&input[..open], args)
      }
      None => (input, Vec::new()),
    };

    let task = TaskId::from_name(name).ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

    let max = task.parameters().len();
    if args.len() > max {
      return Err(TaskError::TooManyArguments {
        task,
        max,
        got: args.len(),
      });
    }

    Ok(Self { task, args })
  }

  /// The argument at `index`, if given and non-empty.
  pub fn arg(&self, index: usize) -> Option<&str> {
    self.args.get(index).map(String::as_str).filter(|a| !a.is_empty())
  }

  /// The argument for parameter `index`, failing when absent.
  pub fn required(&self, index: usize) -> Result<&str, TaskError> {
    self.arg(index).ok_or(TaskError::MissingArgument {
      task: self.task,
      name: self.task.parameters().get(index).copied().unwrap_or("argument"),
    })
  }

  /// Configuration requested through this invocation, if any.
  pub fn configuration(&self) -> Option<&str> {
    if self.task.takes_configuration() { self.arg(0) } else { None }
  }
}

impl fmt::Display for TaskInvocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.args.is_empty() {
      write!(f, "{}", self.task)
    } else {
      write!(f, "{}[{}]", self.task, self.args.join(","))
    }
  }
}
