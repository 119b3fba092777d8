//! Todo List Example - a small spec suite run from `main`
//!
//! Exercises the pieces a real suite uses:
//!
//! - **Hooks**: `before_each` builds a fresh store into the scope
//! - **Spies**: `spy_on` records calls to the store, restored after each spec
//! - **Blocks**: `runs` and `waits_for` drive a delayed save
//! - **Reporters**: `Tracer` logs the run, `Summary` prints the failures
//!
//! One spec fails on purpose so the summary has something to show.
//!
//! Run with `RUST_LOG=kensa=debug cargo run --example todo_list` for the trace.

use std::{cell::Cell, rc::Rc, time::Duration};

use kensa::{
    reporters::{Summary, Tracer},
    *,
};
use tracing_subscriber::EnvFilter;

fn todo_store() -> Object {
    let store = Object::new();
    store.define("add", |args| {
        let title = args.first().and_then(Value::as_str).unwrap_or_default();
        Ok(json!({ "title": title, "done": false }))
    });
    store.define("remove", |_| Ok(Value::Bool(true)));
    store
}

fn register(registry: &mut Registry) {
    registry.describe("TodoList", |s| {
        s.before_each(|cx| {
            cx.set("titles", json!([]));
            Ok(())
        });

        s.it("adds an item", |cx| {
            let store = todo_store();
            let add = cx.spy_on(&store, "add")?.call_through();

            let todo = store.invoke("add", &args!["milk"])?;

            cx.expect(todo).to_equal(json!({ "done": false, "title": "milk" }))?;
            cx.expect_spy(&add).was_called_with(&args!["milk"])?;
            cx.expect_spy(&add).was_called_times(1)?;
            Ok(())
        });

        s.it("starts empty", |cx| {
            cx.expect(cx.get("titles")).to_equal(json!([]))?;
            Ok(())
        });

        s.describe("when saving", |s| {
            s.it("eventually persists", |cx| {
                let saved = Rc::new(Cell::new(false));
                let flag = saved.clone();
                cx.runs(move |_| {
                    flag.set(true);
                    Ok(())
                });
                cx.waits(Duration::from_millis(10));
                let check = saved.clone();
                cx.waits_for_within(move || check.get(), "the save to finish", Duration::from_millis(200));
                cx.runs(move |cx| {
                    cx.expect(saved.get()).to_be_truthy()?;
                    Ok(())
                });
                Ok(())
            });

            s.it_async("counts items", |cx| async move {
                cx.sleep(Duration::from_millis(5)).await?;
                // Fails on purpose.
                cx.expect(json!(["milk", "eggs"])).to_contain("bread")?;
                Ok(())
            });
        });

        s.xit("syncs to the cloud", |_| Ok(()));
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut registry = Registry::new();
    register(&mut registry);

    let mut runner = Runner::default();
    runner.add_reporter(Tracer).add_reporter(Summary::stdout());
    let report = runner.run(&registry).await;

    std::process::exit(report.exit_code());
}
