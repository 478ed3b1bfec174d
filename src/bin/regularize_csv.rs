use shape_regularization::config::load_groups;
use shape_regularization::segments::io::{read_segments_csv, write_segments_csv};
use shape_regularization::{regularize_segments, RegularizationParams};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let input = env::args().nth(1).ok_or_else(usage)?;
    let output = env::args().nth(2).ok_or_else(usage)?;
    let groups_path = env::args().nth(3);
    let params = RegularizationParams {
        maximum_angle_deg: parse_arg(4)?.unwrap_or(25.0),
        maximum_offset: parse_arg(5)?.unwrap_or(0.5),
    };

    let mut segments = read_segments_csv(Path::new(&input)).map_err(|e| e.to_string())?;

    // Without a partition file, all segments regularize as one group.
    let groups = match groups_path {
        Some(path) => load_groups(Path::new(&path)).map_err(|e| e.to_string())?,
        None => vec![(0..segments.len()).collect()],
    };

    let report = regularize_segments(&mut segments, &groups, &params);
    println!(
        "* number of modified segments (angles) = {}",
        report.modified_angles
    );
    println!(
        "* number of modified segments (offsets) = {}",
        report.modified_offsets
    );
    if report.angle_pass_failed || report.offset_pass_failed {
        eprintln!("warning: a regularization pass did not converge; affected segments kept their input geometry");
    }

    write_segments_csv(Path::new(&output), &segments).map_err(|e| e.to_string())?;
    println!(
        "Saved {} segments to {} ({} parallel groups, {:.3} ms)",
        segments.len(),
        output,
        report.parallel_groups,
        report.latency_ms
    );
    Ok(())
}

fn parse_arg(position: usize) -> Result<Option<f64>, String> {
    match env::args().nth(position) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("invalid number {raw:?} at argument {position}")),
    }
}

fn usage() -> String {
    "Usage: regularize_csv <input.csv> <output.csv> [groups.json] [max_angle_deg] [max_offset]"
        .to_string()
}
