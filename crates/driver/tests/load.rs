use camino::{Utf8Path, Utf8PathBuf};
use dir_test::{dir_test, Fixture};
use dtree_driver::{Config, LoadError, LoadErrorKind, Loader, Model};
use engine::print::display_tree;
use engine::{DecisionPolicy, EvalError, PlaybackState};
use test_utils::{record, setup_tracing, Level};

fn fixture_stem(path: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(path);
    path.with_extension("")
}

fn stem(name: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_files")
        .join(name)
}

fn load(name: &str) -> Result<Model, LoadError> {
    Loader::new().load_model(&stem(name), None, &Config::default())
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_files/valid",
    glob: "*.names"
)]
fn loads_valid_model(fixture: Fixture<&str>) {
    let stem = fixture_stem(fixture.path());
    let model = Loader::new()
        .load_model(&stem, None, &Config::default())
        .unwrap_or_else(|err| panic!("{stem}: {err}"));
    assert!(model.unknown_bindings.is_empty());
    assert!(model.tree.stats().terminals > 0);
    assert_eq!(model.tree.name(), model.schema.decision_attribute().name());
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/test_files/invalid",
    glob: "*.names"
)]
fn rejects_invalid_model(fixture: Fixture<&str>) {
    let stem = fixture_stem(fixture.path());
    let mut loader = Loader::new();
    let err = loader
        .load_model(&stem, None, &Config::default())
        .map(|_| ())
        .unwrap_err();
    assert!(!loader.render(&err).is_empty());
}

#[test]
fn playback_model() {
    let _guard = setup_tracing(Level::TRACE);
    let model = load("valid/playback").unwrap();
    let schema = &model.schema;

    let inactive = record(schema, &[("active", "no"), ("role", "music")]);
    let decision = model.tree.evaluate(&inactive).unwrap();
    assert_eq!(schema.decision_name(decision.code().unwrap()), Some("disconnected"));

    let music = record(schema, &[("active", "yes"), ("role", "music")]);
    let mut policy = DecisionPolicy::new();
    assert_eq!(
        policy.playback(model.tree.evaluate(&music)),
        Ok(PlaybackState::Pause)
    );

    let call = record(schema, &[("active", "yes"), ("role", "phone")]);
    assert_eq!(
        policy.playback(model.tree.evaluate(&call)),
        Ok(PlaybackState::Play)
    );

    // Nothing routes a stream whose activity is unknown; the policy keeps
    // the last decision.
    let unknown = record(schema, &[("role", "alarm")]);
    assert_eq!(model.tree.evaluate(&unknown).unwrap_err(), EvalError::NoMatch);
    assert_eq!(
        policy.playback(model.tree.evaluate(&unknown)),
        Ok(PlaybackState::Play)
    );
}

#[test]
fn playback_model_display() {
    let model = load("valid/playback").unwrap();
    assert_eq!(
        display_tree(&model.schema, &model.tree),
        concat!(
            "state\n",
            "├── active = no => disconnected\n",
            "└── active = yes\n",
            "    ├── role in {music, alarm} => suspended\n",
            "    └── role in {phone, navigator} => connected\n",
        )
    );
}

#[test]
fn single_value_subsets() {
    let model = load("valid/count").unwrap();
    let schema = &model.schema;
    for (count, decision) in [("low", "stop"), ("high", "play")] {
        let code = model
            .tree
            .evaluate(&record(schema, &[("count", count)]))
            .unwrap()
            .code();
        assert_eq!(code, schema.decision_code(decision));
    }
}

#[test]
fn value_subsets() {
    let model = load("valid/letters").unwrap();
    let schema = &model.schema;
    let classify = |letter| {
        model
            .tree
            .evaluate(&record(schema, &[("letter", letter)]))
            .map(|decision| decision.code())
    };
    assert_eq!(classify("a"), Ok(schema.decision_code("hit")));
    assert_eq!(classify("c"), Ok(schema.decision_code("hit")));
    assert_eq!(classify("d"), Ok(schema.decision_code("miss")));
    assert_eq!(classify("b"), Err(EvalError::NoMatch));
}

#[test]
fn placeholder_and_untested_branches() {
    let model = load("valid/threshold").unwrap();
    let schema = &model.schema;
    let high = record(schema, &[("count", "high"), ("level", "0.9")]);
    assert_eq!(
        model.tree.evaluate(&high).unwrap().code(),
        schema.decision_code("play")
    );
    let low = record(schema, &[("count", "low"), ("level", "0.9")]);
    assert_eq!(model.tree.evaluate(&low).unwrap_err(), EvalError::NoMatch);
}

#[test]
fn error_kinds_and_lines() {
    for (name, kind, line) in [
        ("invalid/unknown_class", LoadErrorKind::UnresolvedReference, 5),
        ("invalid/missing_decision", LoadErrorKind::SchemaConsistency, 1),
        ("invalid/bad_statement", LoadErrorKind::Syntax, 2),
        ("invalid/too_many_forks", LoadErrorKind::Syntax, 1),
        ("invalid/truncated", LoadErrorKind::Syntax, 5),
    ] {
        let err = load(name).map(|_| ()).unwrap_err();
        assert_eq!(err.kind(), kind, "{name}: {err}");
        assert_eq!(err.line(), Some(line), "{name}: {err}");
    }
}

#[test]
fn unknown_class_points_at_the_tree() {
    let mut loader = Loader::new();
    let err = loader
        .load_model(&stem("invalid/unknown_class"), None, &Config::default())
        .map(|_| ())
        .unwrap_err();
    assert!(err.path().as_str().ends_with("unknown_class.tree"));
    let rendered = loader.render(&err);
    assert!(rendered.contains("unknown_class.tree:5:"), "{rendered}");
    assert!(rendered.contains("pause"), "{rendered}");
}

#[test]
fn missing_tree_file() {
    let mut loader = Loader::new();
    let err = loader
        .load_model(&stem("invalid/no_tree"), None, &Config::default())
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::Io);
    assert_eq!(err.line(), None);
    assert!(err.path().as_str().ends_with("no_tree.tree"));
    assert!(loader.render(&err).starts_with("error: failed to read"));
}

#[test]
fn separate_tree_stem() {
    let model = Loader::new()
        .load_model(
            &stem("invalid/truncated"),
            Some(&stem("valid/count")),
            &Config::default(),
        )
        .unwrap();
    assert_eq!(model.tree.stats().terminals, 2);
}

#[test]
fn configured_bindings() {
    let config = Config::parse("[bindings]\ncount = 0\nlevel = 7\n").unwrap();
    let model = Loader::new()
        .load_model(&stem("valid/count"), None, &config)
        .unwrap();
    assert_eq!(model.unknown_bindings, vec!["level"]);

    let schema = &model.schema;
    let high = vec![Some(engine::Value::Integer(
        schema.integer_value("count", "high").unwrap(),
    ))];
    assert_eq!(
        model.tree.evaluate(&high).unwrap().code(),
        schema.decision_code("play")
    );
}
