use archgraph_core::clarify::ClarificationSession;
use archgraph_core::error::CoreResult;
use archgraph_core::pipeline::{Pipeline, PipelineReport, RunFile};
use archgraph_core::render::{
    render_assignments_csv, render_common_modules_csv, render_partition_csv,
    render_questions_markdown,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when it is set and parses, warnings only otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    // Runs one run file end to end and prints the canonical JSON result.
    // Exit codes: 0 when every resource is decided, 1 on error, 2 on bad
    // usage, 3 when resources still need clarification.
    let args: Vec<String> = std::env::args().collect();
    let (run_path, out_dir) = match args.as_slice() {
        [_, run] => (PathBuf::from(run), None),
        [_, run, flag, dir] if flag == "--out" => (PathBuf::from(run), Some(PathBuf::from(dir))),
        _ => {
            eprintln!("usage: pipeline_runner <run.json> [--out <dir>]");
            std::process::exit(2);
        }
    };

    match execute(&run_path, out_dir.as_deref()) {
        Ok((json, pending)) => {
            println!("{}", json);
            if pending > 0 {
                std::process::exit(3);
            }
        }
        Err(e) => {
            eprintln!("pipeline error: {}", e);
            std::process::exit(1);
        }
    }
}

fn execute(run_path: &Path, out_dir: Option<&Path>) -> CoreResult<(String, usize)> {
    let run = RunFile::load(run_path)?;
    let catalog = run.catalog()?;
    let pipeline = Pipeline::new(run.config.clone(), &catalog, &catalog)?;

    let mut report = pipeline.run(&run.detections)?;
    let mut session = ClarificationSession::new();
    for answer in &run.answers {
        if session.open_question(&answer.identity).is_none() {
            pipeline.ask(&mut report, &mut session, &answer.identity)?;
        }
        pipeline.apply_answer(&mut report, &mut session, answer)?;
    }

    let map = pipeline.map_modules(&mut report, &run.annotations)?;

    let unresolved: Vec<_> = report
        .outcome
        .needs_clarification
        .iter()
        .map(|item| item.resource.identity.clone())
        .collect();
    let mut questions = Vec::new();
    for identity in &unresolved {
        questions.push(pipeline.ask(&mut report, &mut session, identity)?);
    }
    report.audit.verify()?;
    let pending = questions.len();
    tracing::info!(run_id = %report.run_id, pending, "run file processed");

    if let Some(dir) = out_dir {
        write_outputs(dir, &report, &map, &questions)?;
    }

    let out = json!({
        "report": serde_json::to_value(&report)?,
        "module_map": serde_json::to_value(&map)?,
        "questions": serde_json::to_value(&questions)?,
    });
    let json = archgraph_core::determinism::json_canonical::to_canonical_string(&out)?;
    Ok((json, pending))
}

fn write_outputs(
    dir: &Path,
    report: &PipelineReport,
    map: &archgraph_core::mapper::ModuleMap,
    questions: &[archgraph_core::clarify::Question],
) -> CoreResult<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("partition.csv"), render_partition_csv(&report.outcome)?)?;
    std::fs::write(dir.join("assignments.csv"), render_assignments_csv(map)?)?;
    std::fs::write(dir.join("common_modules.csv"), render_common_modules_csv(map)?)?;
    std::fs::write(dir.join("questions.md"), render_questions_markdown(questions))?;
    report.audit.write_ndjson(dir.join("audit.ndjson"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_is_honoured_and_warn_is_the_fallback() {
        std::env::set_var("RUST_LOG", "debug");
        assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::DEBUG));

        std::env::remove_var("RUST_LOG");
        assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::WARN));
    }
}
