//! Records every spec report to `specs.jsonl`, one JSON object per line.
//!
//! Run with `cargo run --example recorder --features recorder`.

use kensa::{Registry, Runner, json, reporters::Recorder};

#[tokio::main(flavor = "current_thread")]
async fn main() -> kensa::Result {
    let mut registry = Registry::new();
    registry.describe("math", |s| {
        s.it("adds", |cx| {
            cx.expect(2 + 2).to_equal(json!(4))?;
            Ok(())
        });
        s.it("compares floats", |cx| {
            cx.expect(0.1 + 0.2).to_be_close_to(0.3, 5)?;
            Ok(())
        });
    });

    let mut runner = Runner::default();
    runner.add_reporter(Recorder::new("specs.jsonl")?);
    let report = runner.run(&registry).await;

    println!("{} specs recorded to specs.jsonl", report.tally().total());
    Ok(())
}
