//! Interactive terminal front end.
//!
//! Every pass through the loop collects a full set of controls and re-runs the
//! pipeline from the top; memoization keeps the repeated steps cheap.

use crate::detection::DetectionParams;
use crate::error::{LensError, Result};
use crate::interrupt::Interrupt;
use crate::output::OutputSink;
use crate::pipeline::{Controls, Pipeline, RenderOutcome, COUNT_RANGE};
use crate::progress::DownloadBar;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

/// Ctrl+C during a render cancels it (including a weights download) and
/// returns to the prompts; Ctrl+C anywhere else quits.
pub fn run(pipeline: &mut Pipeline, output: &mut dyn OutputSink, interrupt: &Interrupt) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut controls = Controls::default();

    loop {
        let summary = pipeline.summary()?;
        if summary.labels().is_empty() {
            println!("The labels file has no annotations.");
            return Ok(());
        }

        let current = controls
            .label
            .as_deref()
            .and_then(|l| summary.label_index(l))
            .unwrap_or(0);
        let label_index = Select::with_theme(&theme)
            .with_prompt("label")
            .items(summary.labels())
            .default(current)
            .interact()
            .map_err(prompt_err)?;
        let label = summary.labels()[label_index].clone();

        controls.min_elts = prompt_count(&theme, &format!("min {}", label), controls.min_elts)?;
        controls.max_elts = prompt_count(&theme, &format!("max {}", label), controls.max_elts)?;
        controls.label = Some(label.clone());

        let selection = pipeline.select(&label, controls.min_elts, controls.max_elts)?;
        if !selection.is_empty() {
            print_counts(&selection.counts);
            let last = selection.len() - 1;
            controls.frame_index = Input::with_theme(&theme)
                .with_prompt(format!("{} frame (0..={})", label, last))
                .default(selection.clamp_index(controls.frame_index))
                .validate_with(move |i: &usize| {
                    if *i <= last {
                        Ok(())
                    } else {
                        Err(format!("pick a frame between 0 and {}", last))
                    }
                })
                .interact_text()
                .map_err(prompt_err)?;

            let detect = Confirm::with_theme(&theme)
                .with_prompt("Run Yolo Detection")
                .default(controls.detection.is_some())
                .interact()
                .map_err(prompt_err)?;
            controls.detection = if detect {
                let previous = controls.detection.unwrap_or_default();
                let confidence = prompt_unit(
                    &theme,
                    "confidence_threshold",
                    previous.confidence_threshold,
                )?;
                let overlap = prompt_unit(&theme, "overlap threshold", previous.overlap_threshold)?;
                Some(DetectionParams::new(confidence, overlap)?)
            } else {
                None
            };
        }

        let cancel = interrupt.arm();
        let mut bar = DownloadBar::new();
        let outcome = pipeline.render(&controls, output, &mut |p| bar.update(p), &cancel);
        bar.finish();
        interrupt.disarm();

        match outcome {
            Ok(outcome) => print_outcome(&outcome),
            Err(LensError::Cancelled) => println!("Render cancelled."),
            Err(e) => return Err(e),
        }

        let again = Confirm::with_theme(&theme)
            .with_prompt("Change the selection?")
            .default(true)
            .interact()
            .map_err(prompt_err)?;
        if !again {
            return Ok(());
        }
    }
}

/// Print what a render produced, the way the browser and the `render` command both show it.
pub fn print_outcome(outcome: &RenderOutcome) {
    match outcome {
        RenderOutcome::NoFrames { message, .. } => println!("{}", message),
        RenderOutcome::Rendered(report) => {
            println!(
                "Ground Truth {}/{} : {} ({} boxes)",
                report.index,
                report.total,
                report.frame,
                report.ground_truth.len()
            );
            match &report.detections {
                Some(boxes) => println!("YOLO Detection: {} boxes", boxes.len()),
                None => println!("Enable detection to compare with ground truth."),
            }
        }
    }
}

/// One line per selected frame: index and object count.
pub fn print_counts(counts: &[u32]) {
    let widest = counts.iter().copied().max().unwrap_or(0).max(1) as usize;
    for (index, count) in counts.iter().enumerate() {
        let bar = "#".repeat(*count as usize * 40 / widest);
        println!("{:>5} {:>3} {}", index, count, bar);
    }
}

fn prompt_count(theme: &ColorfulTheme, prompt: &str, default: u32) -> Result<u32> {
    let (lo, hi) = COUNT_RANGE;
    Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default.clamp(lo, hi))
        .validate_with(move |n: &u32| {
            if (lo..=hi).contains(n) {
                Ok(())
            } else {
                Err(format!("pick a count between {} and {}", lo, hi))
            }
        })
        .interact_text()
        .map_err(prompt_err)
}

fn prompt_unit(theme: &ColorfulTheme, prompt: &str, default: f32) -> Result<f32> {
    let value: f32 = Input::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .validate_with(|v: &f32| {
            if (0.0..=1.0).contains(v) {
                Ok(())
            } else {
                Err("pick a value between 0.0 and 1.0")
            }
        })
        .interact_text()
        .map_err(prompt_err)?;
    // slider step
    Ok((value * 100.0).round() / 100.0)
}

fn prompt_err(e: dialoguer::Error) -> LensError {
    LensError::Io(std::io::Error::other(e.to_string()))
}
