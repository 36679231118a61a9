use super::*;

#[test]
fn parses_draw_with_defaults() {
    let cli = Cli::try_parse_from(["sketchroom-cli", "--token", "alice", "draw", "p1"]).unwrap();
    assert_eq!(cli.token.as_deref(), Some("alice"));
    let Command::Draw(args) = cli.command else {
        panic!("expected draw");
    };
    assert_eq!(args.room.room_id, "p1");
    assert_eq!(args.room.username, "cli");
    assert_eq!(args.fill, "#3498db");
    assert_eq!(args.steps, 10);
    assert!(!args.save);
}

#[test]
fn parses_watch_flags() {
    let cli = Cli::try_parse_from([
        "sketchroom-cli",
        "watch",
        "p1",
        "--username",
        "Watcher",
        "--color",
        "#00ff00",
        "--load",
        "--duration-secs",
        "3",
    ])
    .unwrap();
    let Command::Watch(args) = cli.command else {
        panic!("expected watch");
    };
    assert_eq!(args.room.username, "Watcher");
    assert_eq!(args.room.color.as_deref(), Some("#00ff00"));
    assert!(args.load);
    assert!(!args.autosave);
    assert_eq!(args.duration(), Some(Duration::from_secs(3)));
}

#[test]
fn document_put_reads_stdin_by_default() {
    let cli = Cli::try_parse_from(["sketchroom-cli", "document", "put", "p1"]).unwrap();
    let Command::Document(DocumentCommand { command: DocumentSubcommand::Put { project_id, input } }) = cli.command
    else {
        panic!("expected document put");
    };
    assert_eq!(project_id, "p1");
    assert_eq!(input, "-");
}

#[test]
fn watch_requires_room() {
    assert!(Cli::try_parse_from(["sketchroom-cli", "watch"]).is_err());
}

#[test]
fn blank_token_is_missing() {
    assert!(matches!(require_token(None), Err(CliError::MissingToken)));
    assert!(matches!(require_token(Some("  ".into())), Err(CliError::MissingToken)));
    assert_eq!(require_token(Some("alice".into())).unwrap(), "alice");
}

#[test]
fn document_input_accepts_bare_object_array() {
    let doc = parse_document(r#"[{"id": "r1", "type": "rect"}]"#).unwrap();
    assert_eq!(doc.object_ids().collect::<Vec<_>>(), vec!["r1"]);
    assert_eq!(doc.background_color, "#f8f9fa");
}

#[test]
fn document_input_accepts_full_document() {
    let doc = parse_document(r##"{"canvasData": [], "backgroundColor": "#000000", "width": 800}"##).unwrap();
    assert!(doc.canvas_data.is_empty());
    assert_eq!(doc.background_color, "#000000");
    assert!((doc.width - 800.0).abs() < f64::EPSILON);
}

#[test]
fn document_input_rejects_garbage() {
    assert!(matches!(parse_document("not json"), Err(CliError::InvalidJson(_))));
}

#[test]
fn missing_input_file_names_path() {
    let err = read_input("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.json"));
}
