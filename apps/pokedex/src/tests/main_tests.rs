use super::*;

#[test]
fn show_keys_are_normalized_like_search_terms() {
    let ids: Vec<String> = [" Pikachu ", "", "25", "  "]
        .into_iter()
        .map(String::from)
        .collect();

    assert_eq!(show_keys(&ids), vec!["pikachu".to_string(), "25".to_string()]);
}

#[test]
fn cli_requires_at_least_one_show_id() {
    assert!(Cli::try_parse_from(["pokedex", "show"]).is_err());

    let cli = Cli::try_parse_from(["pokedex", "show", "1", "4", "--interval-ms", "50"])
        .expect("parse");
    match cli.command {
        Command::Show { ids, interval_ms } => {
            assert_eq!(ids, vec!["1", "4"]);
            assert_eq!(interval_ms, 50);
        }
        other => panic!("unexpected command {other:?}"),
    }
}
