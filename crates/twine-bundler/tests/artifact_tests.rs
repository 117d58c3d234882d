//! Packed artifacts executed in an embedded JavaScript engine

mod helpers;

use helpers::{memory_builder, memory_project, run_artifact};

#[tokio::test]
async fn single_module_exports_are_returned_by_the_loader() {
    let runtime = memory_project(&[("index.js", "module.exports = 42;")]);

    let output = memory_builder(&runtime, "index.js").build().await.unwrap();

    assert_eq!(run_artifact(&output.artifact, "js(1)"), "42");
}

#[tokio::test]
async fn modules_run_in_dependency_order_when_loaded() {
    let runtime = memory_project(&[
        ("index.js", "out.push('index:start'); require('./a'); out.push('index:end');"),
        ("a.js", "out.push('a:start'); require('./b'); out.push('a:end');"),
        ("b.js", "out.push('b');"),
    ]);

    let output = memory_builder(&runtime, "index.js").build().await.unwrap();

    assert_eq!(
        run_artifact(&output.artifact, "out.join(',')"),
        "index:start,a:start,b,a:end,index:end"
    );
}

#[tokio::test]
async fn cyclic_modules_see_partial_exports() {
    let runtime = memory_project(&[
        (
            "index.js",
            "var a = require('./a'); module.exports = a.fromB + ':' + require('./b').seenA;",
        ),
        ("a.js", "exports.name = 'a'; exports.fromB = require('./b').name;"),
        ("b.js", "exports.name = 'b'; exports.seenA = require('./a').name;"),
    ]);

    let output = memory_builder(&runtime, "index.js").build().await.unwrap();

    assert_eq!(run_artifact(&output.artifact, "js(1)"), "b:a");
}

#[tokio::test]
async fn shared_dependency_runs_once_under_every_spelling() {
    let runtime = memory_project(&[
        (
            "index.js",
            "var a = require('./a'), b = require('./b'); a.n++;\n\
             module.exports = (a === b) + ':' + b.n + ':' + out.length;",
        ),
        ("a.js", "module.exports = require('./c');"),
        ("b.js", "module.exports = require('./c.js');"),
        ("c.js", "out.push('c'); module.exports = { n: 0 };"),
    ]);

    let output = memory_builder(&runtime, "index.js").build().await.unwrap();

    assert_eq!(run_artifact(&output.artifact, "js(1)"), "true:1:1");
}

#[tokio::test]
async fn injected_modules_are_served_from_the_artifact() {
    let runtime = memory_project(&[
        ("index.js", "module.exports = require('events')() + require('./a');"),
        ("a.js", "module.exports = ':' + require('events')();"),
    ]);

    let output = memory_builder(&runtime, "index.js")
        .include("events", "module.exports = function () { return 'EV'; };")
        .build()
        .await
        .unwrap();

    assert_eq!(run_artifact(&output.artifact, "js(1)"), "EV:EV");
}

#[tokio::test]
async fn development_artifacts_behave_like_production_ones() {
    let runtime = memory_project(&[
        ("index.js", "module.exports = require('./lib/').name;"),
        ("lib/index.js", "exports.name = 'lib';"),
    ]);

    let prod = memory_builder(&runtime, "index.js").build().await.unwrap();
    let dev = memory_builder(&runtime, "index.js")
        .development(true)
        .build()
        .await
        .unwrap();

    assert_eq!(run_artifact(&prod.artifact, "js(1)"), "lib");
    assert_eq!(run_artifact(&dev.artifact, "js(1)"), "lib");
}

#[tokio::test]
async fn unknown_ids_throw_module_not_found() {
    let runtime = memory_project(&[("index.js", "")]);

    let output = memory_builder(&runtime, "index.js").build().await.unwrap();

    assert_eq!(
        run_artifact(
            &output.artifact,
            "(function () { try { js(99); return 'loaded'; } catch (e) { return e.code; } })()"
        ),
        "MODULE_NOT_FOUND"
    );
}
