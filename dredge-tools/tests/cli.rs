// SPDX-License-Identifier: AGPL-3.0-or-later
// Dredge - Adaptive Filter Search Platform
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! CLI exit-code and output checks

use std::io::Write;
use std::process::Command;

fn write_spec(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path
}

#[test]
fn check_accepts_a_valid_spec() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(
        &dir,
        "ok.fspec",
        "FILTER rgb\nTHRESHOLD 1\nFILTER APPLICATION\nTHRESHOLD 50\nREQUIRES rgb\n",
    );
    let output = Command::new(env!("CARGO_BIN_EXE_dredge"))
        .args(["check", "--spec"])
        .arg(&spec)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 filter(s)"));
    assert!(stdout.contains("APPLICATION"));
}

#[test]
fn check_rejects_threshhold_typo_with_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(&dir, "typo.fspec", "FILTER A\nTHRESHHOLD 3\n");
    let output = Command::new(env!("CARGO_BIN_EXE_dredge"))
        .args(["check", "--spec"])
        .arg(&spec)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("THRESHOLD"), "stderr: {}", stderr);
}

#[test]
fn check_rejects_requires_cycle_with_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(
        &dir,
        "cycle.fspec",
        "FILTER A\nREQUIRES B\nFILTER B\nREQUIRES A\n",
    );
    let output = Command::new(env!("CARGO_BIN_EXE_dredge"))
        .args(["check", "--spec"])
        .arg(&spec)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn simulate_small_stream_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let spec = write_spec(
        &dir,
        "sim.fspec",
        "FILTER a\nTHRESHOLD 10\nFILTER b\nTHRESHOLD 10\n",
    );
    let profile = dir.path().join("profile.json");
    std::fs::write(
        &profile,
        r#"{"filters": {"a": {"pass_rate": 0.8, "cost_us": 0},
                        "b": {"pass_rate": 0.2, "cost_us": 0}},
            "default": {"pass_rate": 0.5, "cost_us": 0}}"#,
    )
    .unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_dredge"))
        .args(["simulate", "--objects", "200", "--workers", "2", "--json", "--spec"])
        .arg(&spec)
        .arg("--profile")
        .arg(&profile)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["exit_code"], 0);
    assert_eq!(value["stats"]["objects_processed"], 200);
}
