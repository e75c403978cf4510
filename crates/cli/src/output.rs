//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, plan and report rendering, and JSON output.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use pinsync_lib::sync::{CollectionPlan, PassReport};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

/// `1 item`, `2 items`.
pub fn plural(count: usize, noun: &str) -> String {
  if count == 1 {
    format!("{} {}", count, noun)
  } else {
    format!("{} {}s", count, noun)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Prints every non-empty plan. Returns the total number of actions.
pub fn print_plans(plans: &[CollectionPlan]) -> usize {
  let mut total = 0;
  for CollectionPlan { collection, plan } in plans.iter().filter(|p| !p.plan.is_empty()) {
    println!("Collection {}:", collection);
    for create in &plan.to_create {
      println!(
        "  {} {} {}",
        symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
        create.target,
        format!("({})", create.key).if_supports_color(Stream::Stdout, |s| s.dimmed())
      );
    }
    for update in &plan.to_update {
      println!(
        "  {} {} {} {}",
        symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
        update.instance,
        symbols::ARROW,
        update.target
      );
    }
    for instance in &plan.to_remove {
      println!(
        "  {} {}",
        symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
        instance
      );
    }
    total += plan.action_count();
  }
  total
}

pub fn print_report(report: &PassReport) {
  if report.seeded {
    print_info("Seeded canonical mapping from pinned items");
  }
  for outcome in report.collections.iter().filter(|c| c.changed()) {
    print_stat(
      &format!("Collection {}", outcome.collection),
      &format!(
        "{} created, {} updated, {} removed",
        outcome.created, outcome.updated, outcome.removed
      ),
    );
  }
  for failure in report.failures() {
    print_warning(&format!(
      "Collection {}: failed to {}: {}",
      failure.collection, failure.action, failure.error
    ));
  }

  let summary = format!(
    "Sync complete: {} created, {} updated, {} removed across {}",
    report.created(),
    report.updated(),
    report.removed(),
    plural(report.collections.len(), "collection")
  );
  if report.is_success() {
    print_success(&summary);
  } else {
    print_warning(&summary);
  }
}
