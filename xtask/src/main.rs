// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::Path;
use std::process::{Command, ExitCode};

const GATES: &[(&str, &[&str])] = &[
    ("fmt", &["fmt", "--all", "--", "--check"]),
    (
        "lint",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    ),
    ("test", &["test", "--workspace"]),
    ("bench-build", &["bench", "--workspace", "--no-run"]),
];

fn run(root: &Path, args: &[&str]) -> Result<(), String> {
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let status = Command::new(&cargo)
        .args(args)
        .current_dir(root)
        .status()
        .map_err(|e| format!("failed to run `{cargo} {}`: {e}", args.join(" ")))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("command failed: cargo {}", args.join(" ")))
    }
}

fn gate(root: &Path, name: &str) -> Option<Result<(), String>> {
    GATES
        .iter()
        .find(|(gate, _)| *gate == name)
        .map(|(_, args)| run(root, args))
}

fn main() -> ExitCode {
    let arg = env::args().nth(1).unwrap_or_else(|| "help".to_string());
    let Some(root) = Path::new(env!("CARGO_MANIFEST_DIR")).parent() else {
        eprintln!("xtask must live one level below the workspace root");
        return ExitCode::FAILURE;
    };

    let result = match arg.as_str() {
        "ci" => GATES
            .iter()
            .try_for_each(|(_, args)| run(root, args)),
        "help" | "--help" | "-h" => {
            eprintln!("xtask commands:");
            for (name, _) in GATES {
                eprintln!("  {name}");
            }
            eprintln!("  ci  (every gate, in order)");
            Ok(())
        }
        other => gate(root, other).unwrap_or_else(|| {
            Err(format!(
                "unknown xtask command: {other} (try `cargo run -p xtask -- help`)"
            ))
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
