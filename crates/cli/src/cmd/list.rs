//! Implementation of `nbake --tasks`.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

use nbake_lib::platform::HostPlatform;
use nbake_lib::task::{TaskGraph, TaskId};

use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct TaskListing {
  name: TaskId,
  description: &'static str,
  parameters: &'static [&'static str],
  prerequisites: Vec<TaskId>,
}

pub fn cmd_list(format: OutputFormat) -> Result<()> {
  let platform = HostPlatform::detect();
  let graph = TaskGraph::standard(&platform)?;

  let listings: Vec<TaskListing> = TaskId::ALL
    .into_iter()
    .map(|task| TaskListing {
      name: task,
      description: task.description(),
      parameters: task.parameters(),
      prerequisites: graph.prerequisites(task),
    })
    .collect();

  if format.is_json() {
    return print_json(&serde_json::json!({
      "host": platform.identifier(),
      "toolchain": platform.toolchain(),
      "tasks": listings,
    }));
  }

  print_stat("Host", &format!("{} ({})", platform, platform.toolchain()));
  println!();

  for listing in &listings {
    let signature = if listing.parameters.is_empty() {
      listing.name.to_string()
    } else {
      format!("{}[{}]", listing.name, listing.parameters.join(","))
    };
    println!(
      "  {} {}",
      format!("{:<28}", signature).if_supports_color(Stream::Stdout, |s| s.bold()),
      listing.description
    );
    if !listing.prerequisites.is_empty() {
      let names: Vec<&str> = listing.prerequisites.iter().map(TaskId::name).collect();
      println!(
        "  {:<28} {}",
        "",
        format!("needs: {}", names.join(", ")).if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
  }

  Ok(())
}
