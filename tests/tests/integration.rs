use std::fs;
use std::path::Path;
use std::sync::Arc;

use hotframe_kernel::frame::{FrameError, TemplateError, TemplateParams};
use hotframe_kernel::reload::{ResolutionError, TypeDescriptor};
use hotframe_reload::{ReloadConfig, ReloadEvent, ReloadableLoaderScope, StableRegistry};
use hotframe_render::{ActionHooks, FrameTemplate, RenderPipeline, TemplateConfig};
use hotframe_testing::{
    EchoTemplate, EventLog, FailingSink, FailingTemplate, RecordingHook, ScriptedCache,
    ScriptedFrame, assert_events,
};
use serde_json::json;

fn globals(value: serde_json::Value) -> TemplateParams {
    serde_json::from_value(value).unwrap()
}

fn hooked_pipeline(log: &EventLog) -> RenderPipeline {
    let hooks = Arc::new(ActionHooks::new());
    hooks.register(Arc::new(RecordingHook::new(log.clone())));
    RenderPipeline::new().with_hooks(hooks)
}

#[test]
fn test_end_to_end_render_with_overlapping_global() {
    let template = Arc::new(EchoTemplate::new());
    let mut frame = ScriptedFrame::new("NewsFrame", template.clone())
        .with_action("refresh")
        .sets_on_action("a", json!(1))
        .sets_on_action("b", json!(2));

    let out = RenderPipeline::new()
        .render(&mut frame, &globals(json!({"b": 3, "c": 4})))
        .unwrap();

    assert_eq!(out.as_deref(), Some("a=1\nb=3\nc=4\n"));
    assert_eq!(template.call_count(), 1);
    assert_eq!(frame.finalize_always_count(), 1);
    assert_events!(
        frame.log(),
        ["prepare", "initialize", "action:refresh", "finalize", "finalize_always"]
    );
}

#[test]
fn test_hooks_surround_action() {
    let log = EventLog::new();
    let mut frame = ScriptedFrame::new("NewsFrame", Arc::new(EchoTemplate::new())).with_log(log.clone());

    hooked_pipeline(&log)
        .render(&mut frame, &TemplateParams::new())
        .unwrap();

    assert_events!(
        log,
        [
            "prepare",
            "initialize",
            "before:NewsFrame",
            "action:default",
            "after:NewsFrame",
            "finalize",
            "finalize_always"
        ]
    );
}

#[test]
fn test_cache_hit_bypasses_action_and_hooks() {
    let log = EventLog::new();
    let cache = Arc::new(ScriptedCache::hit("<cached/>").with_log(log.clone()));
    let template = Arc::new(EchoTemplate::new());
    let mut frame = ScriptedFrame::new("NewsFrame", template.clone()).with_log(log.clone());

    let out = hooked_pipeline(&log)
        .with_cache(cache.clone())
        .render(&mut frame, &TemplateParams::new())
        .unwrap();

    assert_eq!(out.as_deref(), Some("<cached/>"));
    assert_events!(log, ["intercept", "finalize_always"]);
    assert!(cache.stored().is_empty());
    assert_eq!(template.call_count(), 0);
}

#[test]
fn test_cache_miss_stores_fresh_render() {
    let log = EventLog::new();
    let cache = Arc::new(ScriptedCache::miss().with_log(log.clone()));
    let mut frame = ScriptedFrame::new("NewsFrame", Arc::new(EchoTemplate::new()))
        .with_log(log.clone())
        .with_param("title", json!("Today"));

    let out = RenderPipeline::new()
        .with_cache(cache.clone())
        .render(&mut frame, &TemplateParams::new())
        .unwrap();

    assert_eq!(out.as_deref(), Some("title=Today\n"));
    assert_eq!(cache.stored(), vec![("NewsFrame".to_string(), "title=Today\n".to_string())]);
    assert_eq!(log.entries().first().map(String::as_str), Some("intercept"));
    assert_eq!(log.count("postprocess"), 1);
}

#[test]
fn test_skip_template_decided_by_action() {
    let cache = Arc::new(ScriptedCache::miss());
    let template = Arc::new(EchoTemplate::new());
    let mut frame = ScriptedFrame::new("Redirector", template.clone()).skipping_template_after_action();

    let out = RenderPipeline::new()
        .with_cache(cache.clone())
        .render(&mut frame, &TemplateParams::new())
        .unwrap();

    assert!(out.is_none());
    assert_eq!(cache.intercept_count(), 1);
    assert!(cache.stored().is_empty());
    assert_eq!(template.call_count(), 0);
    assert_eq!(frame.finalize_always_count(), 1);
}

#[test]
fn test_skip_template_skips_cache_check() {
    let cache = Arc::new(ScriptedCache::hit("<stale/>"));
    let mut frame = ScriptedFrame::new("Redirector", Arc::new(EchoTemplate::new())).skipping_template();

    let out = RenderPipeline::new()
        .with_cache(cache.clone())
        .render(&mut frame, &TemplateParams::new())
        .unwrap();

    assert!(out.is_none());
    assert_eq!(cache.intercept_count(), 0);
    assert!(frame.log().contains("action:default"));
}

#[test]
fn test_finalize_always_runs_once_on_action_error() {
    let log = EventLog::new();
    let cache = Arc::new(ScriptedCache::miss());
    let mut frame = ScriptedFrame::new("NewsFrame", Arc::new(EchoTemplate::new()))
        .with_log(log.clone())
        .with_action("save")
        .failing_action("database unavailable");

    let err = hooked_pipeline(&log)
        .with_cache(cache.clone())
        .render(&mut frame, &TemplateParams::new())
        .unwrap_err();

    assert!(matches!(err, FrameError::Action { ref action, .. } if action == "save"));
    assert_eq!(frame.finalize_always_count(), 1);
    assert!(!log.contains("after:NewsFrame"));
    assert_events!(
        log,
        [
            "prepare",
            "initialize",
            "before:NewsFrame",
            "action:save",
            "finalize",
            "finalize_always"
        ]
    );
    assert!(cache.stored().is_empty());
}

#[test]
fn test_finalize_always_runs_once_on_template_error() {
    let cache = Arc::new(ScriptedCache::miss());
    let mut frame = ScriptedFrame::new("NewsFrame", Arc::new(FailingTemplate::new("bad tag")));

    let err = RenderPipeline::new()
        .with_cache(cache.clone())
        .render(&mut frame, &TemplateParams::new())
        .unwrap_err();

    match err {
        FrameError::Template(e) => {
            assert_eq!(e.frame(), "NewsFrame");
            assert!(matches!(e.cause(), TemplateError::Other(m) if m == "bad tag"));
            assert!(e.to_string().starts_with("Can't render frame NewsFrame"));
        }
        other => panic!("expected a template error, got {other}"),
    }
    assert_eq!(frame.finalize_always_count(), 1);
    assert!(cache.stored().is_empty());
}

#[test]
fn test_finalize_always_runs_once_on_prepare_error() {
    let log = EventLog::new();
    let mut frame = ScriptedFrame::new("NewsFrame", Arc::new(EchoTemplate::new()))
        .with_log(log.clone())
        .failing_prepare("no session");

    let err = hooked_pipeline(&log)
        .render(&mut frame, &TemplateParams::new())
        .unwrap_err();

    assert!(matches!(err, FrameError::Lifecycle { step: "prepare", .. }));
    assert_events!(log, ["prepare", "finalize_always"]);
}

#[test]
fn test_sink_failure_is_a_template_error() {
    let mut frame = ScriptedFrame::new("NewsFrame", Arc::new(EchoTemplate::new())).with_param("a", json!(1));

    let err = RenderPipeline::new()
        .render_to(&mut frame, &TemplateParams::new(), &mut FailingSink)
        .unwrap_err();

    assert!(matches!(
        err,
        FrameError::Template(ref e) if matches!(e.cause(), TemplateError::Io(_))
    ));
    assert_eq!(frame.finalize_always_count(), 1);
}

#[test]
fn test_once_fragment_across_frames_sharing_config() {
    let config = Arc::new(TemplateConfig::new());
    let source = "{{#once scope=\"news.css\"}}<link href=\"news.css\"/>{{/once}}<li>{{ title }}</li>";
    let template = Arc::new(FrameTemplate::parse("news-item", source, config.clone()).unwrap());
    let pipeline = RenderPipeline::new();

    let mut first = ScriptedFrame::new("Item", template.clone()).sets_on_action("title", json!("One"));
    let mut second = ScriptedFrame::new("Item", template.clone()).sets_on_action("title", json!("Two"));

    let a = pipeline.render(&mut first, &TemplateParams::new()).unwrap();
    let b = pipeline.render(&mut second, &TemplateParams::new()).unwrap();

    assert_eq!(a.as_deref(), Some("<link href=\"news.css\"/><li>One</li>"));
    assert_eq!(b.as_deref(), Some("<li>Two</li>"));
    assert_eq!(config.once_registry().len(), 1);
}

#[test]
fn test_once_usage_error_aborts_render() {
    let config = Arc::new(TemplateConfig::new());
    let template = Arc::new(
        FrameTemplate::parse("bad", "{{#once scope=\"\"}}x{{/once}}", config).unwrap(),
    );
    let mut frame = ScriptedFrame::new("Bad", template);

    let err = RenderPipeline::new()
        .render(&mut frame, &TemplateParams::new())
        .unwrap_err();

    assert!(matches!(
        err,
        FrameError::Template(ref e) if matches!(e.cause(), TemplateError::Usage(_))
    ));
    assert_eq!(frame.finalize_always_count(), 1);
}

fn write_unit(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn reload_scope(root: &Path, stable: Arc<StableRegistry>) -> ReloadableLoaderScope {
    let config = ReloadConfig::new()
        .with_class_path_root(root)
        .with_reloadable_prefix("com.app")
        .with_exception_prefix("com.app.support");
    ReloadableLoaderScope::new(config, stable).unwrap()
}

#[test]
fn test_hot_swap_across_rotation() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "com/app/News.frame", "version 1");

    let stable = Arc::new(StableRegistry::new());
    let scope = reload_scope(dir.path(), stable.clone());

    let first = scope.resolve("com.app.News").unwrap();
    assert!(TypeDescriptor::same(&first, &scope.resolve("com.app.News").unwrap()));
    assert_eq!(first.tier().generation(), Some(1));

    write_unit(dir.path(), "com/app/News.frame", "version 2");
    scope.rotate().unwrap();

    let second = scope.resolve("com.app.News").unwrap();
    assert!(!TypeDescriptor::same(&first, &second));
    assert_ne!(first.digest(), second.digest());
    assert_eq!(second.tier().generation(), Some(2));
    assert_eq!(second.unit(), b"version 2");
    assert_eq!(first.unit(), b"version 1");
}

#[test]
fn test_stable_identity_survives_rotation() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "com/app/support/Util.frame", "shadow copy");

    let stable = Arc::new(StableRegistry::new());
    let framework = stable.register_named("org.framework.Page");
    let support = stable.register_named("com.app.support.Util");
    let scope = reload_scope(dir.path(), stable.clone());

    let before = scope.resolve("org.framework.Page").unwrap();
    let support_before = scope.resolve("com.app.support.Util").unwrap();
    scope.rotate().unwrap();
    scope.rotate().unwrap();

    assert!(TypeDescriptor::same(&framework, &before));
    assert!(TypeDescriptor::same(&before, &scope.resolve("org.framework.Page").unwrap()));
    assert!(TypeDescriptor::same(&support, &support_before));
    assert!(!support_before.tier().is_reloadable());
}

#[test]
fn test_missing_reloadable_unit_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let stable = Arc::new(StableRegistry::new());
    stable.register_named("com.app.Ghost");
    let scope = reload_scope(dir.path(), stable);

    let err = scope.resolve("com.app.Ghost").unwrap_err();
    assert!(matches!(err, ResolutionError::NotFound { .. }));
}

#[test]
fn test_held_generation_keeps_resolving_after_rotation() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "com/app/News.frame", "v1");
    let scope = reload_scope(dir.path(), Arc::new(StableRegistry::new()));

    let held = scope.current();
    let first = held.resolve("com.app.News").unwrap();

    write_unit(dir.path(), "com/app/News.frame", "v2");
    scope.rotate().unwrap();

    assert!(TypeDescriptor::same(&first, &held.resolve("com.app.News").unwrap()));
    assert_eq!(held.generation(), 1);
    assert_eq!(scope.generation(), 2);
}

#[test]
fn test_failed_rotation_keeps_previous_generation() {
    let dir = tempfile::tempdir().unwrap();
    let scope = reload_scope(dir.path(), Arc::new(StableRegistry::new()));
    let mut events = scope.subscribe();

    scope.reconfigure(ReloadConfig::new().with_class_path_root(dir.path().join("missing")));
    assert!(scope.rotate().is_err());
    assert_eq!(scope.generation(), 1);

    match events.try_recv().unwrap() {
        ReloadEvent::RotationFailed { generation, .. } => assert_eq!(generation, 2),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_rotation_events_are_broadcast() {
    let dir = tempfile::tempdir().unwrap();
    let scope = reload_scope(dir.path(), Arc::new(StableRegistry::new()));
    let mut events = scope.subscribe();

    scope.rotate().unwrap();

    match events.recv().await.unwrap() {
        ReloadEvent::GenerationRotated { previous, current, .. } => {
            assert_eq!((previous, current), (1, 2));
        }
        other => panic!("unexpected event {other:?}"),
    }
}
