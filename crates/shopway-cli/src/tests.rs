use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shopway-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(cli.payload.is_none());
}

#[test]
fn parses_route_command() {
    let cli = Cli::try_parse_from([
        "shopway-cli",
        "route",
        "--commerce",
        "7",
        "--lat",
        "48.86",
        "--lng",
        "2.34",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Route {
            commerce: 7,
            profile: None,
            json: false,
            ..
        })
    ));
}

#[test]
fn route_profile_is_parsed_as_transport_mode() {
    let cli = Cli::try_parse_from([
        "shopway-cli",
        "route",
        "--commerce",
        "7",
        "--lat",
        "48.86",
        "--lng",
        "2.34",
        "--profile",
        "cycling",
        "--json",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Route {
            profile: Some(TransportMode::Bike),
            json: true,
            ..
        })
    ));
}

#[test]
fn route_rejects_unknown_profile() {
    let result = Cli::try_parse_from([
        "shopway-cli",
        "route",
        "--commerce",
        "7",
        "--lat",
        "48.86",
        "--lng",
        "2.34",
        "--profile",
        "hovercraft",
    ]);
    assert!(result.is_err());
}

#[test]
fn route_requires_commerce() {
    let result = Cli::try_parse_from(["shopway-cli", "route", "--lat", "1", "--lng", "2"]);
    assert!(result.is_err());
}

#[test]
fn nearest_accepts_negative_coordinates_and_defaults_limit() {
    let cli = Cli::try_parse_from(["shopway-cli", "nearest", "--lat", "-33.86", "--lng", "-70.6"])
        .unwrap();

    match cli.command {
        Some(Commands::Nearest { lat, lng, limit }) => {
            assert!((lat + 33.86).abs() < f64::EPSILON);
            assert!((lng + 70.6).abs() < f64::EPSILON);
            assert_eq!(limit, 5);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn payload_flag_is_global() {
    let cli = Cli::try_parse_from(["shopway-cli", "check", "--payload", "fixtures/site.yaml"])
        .unwrap();
    assert!(matches!(cli.command, Some(Commands::Check)));
    assert_eq!(cli.payload, Some(PathBuf::from("fixtures/site.yaml")));
}

#[test]
fn payload_flag_wins_over_default() {
    assert_eq!(
        payload_path(Some(PathBuf::from("a.json"))),
        PathBuf::from("a.json")
    );
}
