use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["socdash-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_save_without_force() {
    let cli = Cli::try_parse_from(["socdash-cli", "save"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Save { force: false })));
}

#[test]
fn parses_save_with_force() {
    let cli =
        Cli::try_parse_from(["socdash-cli", "save", "--force"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Save { force: true })));
}

#[test]
fn parses_series_with_and_without_year() {
    let cli = Cli::try_parse_from(["socdash-cli", "series"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Series { year: None })));

    let cli = Cli::try_parse_from(["socdash-cli", "series", "--year", "2024"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Series { year: Some(2024) })
    ));
}

#[test]
fn series_rejects_non_numeric_year() {
    assert!(Cli::try_parse_from(["socdash-cli", "series", "--year", "last"]).is_err());
}

#[test]
fn parses_rehost_url() {
    let cli = Cli::try_parse_from(["socdash-cli", "rehost", "https://cdn.example.com/a.png"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Rehost { url }) => assert_eq!(url, "https://cdn.example.com/a.png"),
        other => panic!("expected rehost command, got {other:?}"),
    }
}

#[test]
fn rehost_requires_url() {
    assert!(Cli::try_parse_from(["socdash-cli", "rehost"]).is_err());
}
