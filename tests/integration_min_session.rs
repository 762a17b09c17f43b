// Drives the compiled binary through a PTY: a one-question round on a
// single table, answered, then back home and out.
//
// Requires a TTY, so it is Unix-only and ignored by default.
// Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn one_question_round_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("timestables");
    let cmd = format!("{} --memory -q 1 -t 1 --seed 3", bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // start the round
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));

    // right or wrong, one answer ends the round
    p.send("0\r")?;

    // wait out the feedback pause, then leave results and quit from home
    std::thread::sleep(Duration::from_millis(3000));
    p.send("h")?;
    std::thread::sleep(Duration::from_millis(100));
    p.send("\x1b")?;

    p.expect(Eof)?;
    Ok(())
}
