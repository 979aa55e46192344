use market_facets::adapters::HistoryNavigator;
use market_facets::core::codec;
use market_facets::{
    AppConfig, Category, CategoryHierarchy, Facets, FilterSchema, FilterState, ListingPage,
    Mutation,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn jobs_facets() -> Facets {
    let hierarchy = CategoryHierarchy::new(vec![
        Category::new("plumbing", "Plumbing")
            .with_sub_role("pipe_fitter", "Pipe Fitter")
            .with_sub_role("drain_specialist", "Drain Specialist"),
        Category::new("electrical", "Electrical")
            .with_sub_role("wireman", "Wireman")
            .with_sub_role("solar_installer", "Solar Installer"),
        Category::new("carpentry", "Carpentry"),
    ])
    .unwrap();
    Facets::new(FilterSchema::jobs(), hierarchy)
}

fn jobs_page(url: &str) -> ListingPage {
    ListingPage::from_url(url, jobs_facets())
}

/// Token order may shift on re-insertion; the selected set may not.
fn selection(page: &ListingPage) -> Vec<(String, Vec<String>)> {
    page.state()
        .iter()
        .map(|(key, _)| {
            let mut tokens = page.state().tokens(key);
            tokens.sort();
            (key.to_string(), tokens)
        })
        .collect()
}

#[test]
fn test_category_toggle_twice_restores_state() {
    let starts = [
        "/jobs",
        "/jobs?category=plumbing",
        "/jobs?category=electrical,carpentry&urgent=1",
    ];
    for start in starts {
        for token in ["plumbing", "electrical", "carpentry", "welding"] {
            let mut page = jobs_page(start);
            let original = selection(&page);
            page.toggle_member("category", token);
            assert_ne!(
                selection(&page),
                original,
                "toggle of {} on {} changed nothing",
                token,
                start
            );
            page.toggle_member("category", token);
            assert_eq!(selection(&page), original, "toggle of {} on {}", token, start);
        }
    }
}

#[test]
fn test_toggle_appends_in_order() {
    let mut page = jobs_page("/jobs?category=plumbing");
    let visit = page.toggle_member("category", "electrical");
    assert_eq!(visit.url, "/jobs?category=plumbing,electrical");
}

#[test]
fn test_deselecting_category_removes_only_its_sub_roles() {
    let mut page = jobs_page(
        "/jobs?category=plumbing,electrical&sub_category=pipe_fitter,wireman,drain_specialist,solar_installer",
    );
    let visit = page.toggle_member("category", "plumbing");
    assert_eq!(
        visit.url,
        "/jobs?category=electrical&sub_category=wireman,solar_installer"
    );
}

#[test]
fn test_deselecting_last_category_drops_both_keys() {
    let mut page = jobs_page("/jobs?category=plumbing&sub_category=pipe_fitter");
    let visit = page.toggle_member("category", "plumbing");
    assert_eq!(visit.url, "/jobs");
}

#[test]
fn test_selecting_sub_role_selects_parent() {
    let mut page = jobs_page("/jobs?category=carpentry");
    page.toggle_member("sub_category", "wireman");
    assert_eq!(page.state().tokens("category"), vec!["carpentry", "electrical"]);
    assert_eq!(page.state().tokens("sub_category"), vec!["wireman"]);

    // parent already present: no duplicate
    page.toggle_member("sub_category", "solar_installer");
    assert_eq!(page.state().tokens("category"), vec!["carpentry", "electrical"]);
}

#[test]
fn test_deselecting_sub_role_keeps_parent() {
    let mut page = jobs_page("/jobs?category=electrical&sub_category=wireman");
    let visit = page.toggle_member("sub_category", "wireman");
    assert_eq!(visit.url, "/jobs?category=electrical");
}

#[test]
fn test_date_posted_zero_matches_absence() {
    let mut with_zero = jobs_page("/jobs?type=contract");
    let mut untouched = jobs_page("/jobs?type=contract");
    with_zero.set_filter("date_posted", Some("0"));
    untouched.set_filter("location", None);
    assert_eq!(with_zero.url(), untouched.url());
    assert_eq!(with_zero.url(), "/jobs?type=contract");

    let mut page = jobs_page("/jobs?date_posted=7");
    assert_eq!(page.set_filter("date_posted", Some("0")).url, "/jobs");

    let page = jobs_page("/jobs?date_posted=0&type=contract");
    assert!(!page.state().contains_key("date_posted"));
}

#[test]
fn test_remove_salary_token() {
    let mut page = jobs_page("/jobs?salary=1000-2000,2000-3000");
    let visit = page.remove_filter("salary", "1000-2000");
    assert_eq!(visit.url, "/jobs?salary=2000-3000");

    let visit = page.remove_filter("salary", "2000-3000");
    assert_eq!(visit.url, "/jobs");
    assert!(!visit.url.contains("salary="));
}

#[test]
fn test_every_mutation_resets_page() {
    let mutations = [
        Mutation::set("location", Some("Lagos")),
        Mutation::set("location", None),
        Mutation::toggle("type", "full_time"),
        Mutation::toggle("sub_category", "wireman"),
        Mutation::remove("category", "plumbing"),
        Mutation::remove("urgent", "1"),
        Mutation::ClearAll,
    ];
    for mutation in mutations {
        let mut page = jobs_page("/jobs?category=plumbing&urgent=1&page=5");
        let visit = page.apply(&mutation);
        assert!(!visit.url.contains("page="), "{:?} kept page: {}", mutation, visit.url);
        assert!(visit.preserve_scroll);
    }
}

#[test]
fn test_urgent_chip_removal_end_to_end() {
    let navigator = HistoryNavigator::new();
    let mut page = jobs_page("/jobs?type=full_time,part_time&urgent=1");

    let chips = page.chips();
    let type_chips: Vec<_> = chips.iter().filter(|c| c.key == "type").collect();
    let urgent_chips: Vec<_> = chips.iter().filter(|c| c.key == "urgent").collect();
    assert_eq!(chips.len(), 3);
    assert_eq!(type_chips.len(), 2);
    assert_eq!(urgent_chips.len(), 1);
    assert_eq!(type_chips[0].label, "Full Time");
    assert_eq!(urgent_chips[0].label, "Urgent");

    let removal = urgent_chips[0].removal();
    page.navigate(&navigator, &removal);

    let visit = navigator.current().unwrap();
    assert_eq!(visit.url, "/jobs?type=full_time,part_time");
    let state = codec::decode(page.facets().schema(), visit.query().unwrap());
    assert!(!state.contains_key("urgent"));
    assert_eq!(state.tokens("type"), vec!["full_time", "part_time"]);
}

#[test]
fn test_category_chip_removal_cascades() {
    let mut page = jobs_page("/jobs?category=plumbing,electrical&sub_category=pipe_fitter,wireman");
    let chip = page
        .chips()
        .into_iter()
        .find(|c| c.key == "category" && c.token == "plumbing")
        .unwrap();
    assert_eq!(chip.label, "Plumbing");

    let visit = page.remove_chip(&chip);
    assert_eq!(visit.url, "/jobs?category=electrical&sub_category=wireman");
}

#[test]
fn test_unknown_keys_and_tokens_pass_through() {
    let mut page = jobs_page("/jobs?ref=whatsapp&category=welding");
    let chips = page.chips();
    assert_eq!(chips.len(), 1);
    assert_eq!(chips[0].label, "welding");

    let visit = page.toggle_member("type", "contract");
    assert_eq!(visit.url, "/jobs?category=welding&ref=whatsapp&type=contract");
}

#[test]
fn test_pure_transitions_do_not_touch_input() {
    let facets = jobs_facets();
    let state = FilterState::new().with_tokens("category", ["plumbing"]);
    let next = facets.toggle_member(&state, "category", "electrical");
    assert_eq!(state.tokens("category"), vec!["plumbing"]);
    assert_eq!(next.tokens("category"), vec!["plumbing", "electrical"]);
}

#[test]
fn test_store_page_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[server]
base_url = "https://market.example"

[[categories]]
id = "fabrics"
label = "Fabrics"
sub_roles = [{ id = "ankara", label = "Ankara" }, { id = "lace", label = "Lace" }]

[pages.store]
path = "/stores/search"
preset = "store_search"
"#,
    )
    .unwrap();

    let config = AppConfig::from_file(file.path()).unwrap();
    let navigator = HistoryNavigator::new();
    let mut page = ListingPage::from_url(
        "/stores/search?store=adire-house&page=3",
        config.facets("store").unwrap(),
    );

    page.navigate(&navigator, &Mutation::toggle("sub_category", "lace"));
    page.navigate(&navigator, &Mutation::set("sort", Some("price_low")));
    page.navigate(&navigator, &Mutation::ClearAll);

    let urls: Vec<String> = navigator.visits().into_iter().map(|v| v.url).collect();
    assert_eq!(
        urls,
        vec![
            "/stores/search?category=fabrics&store=adire-house&sub_category=lace",
            "/stores/search?category=fabrics&sort=price_low&store=adire-house&sub_category=lace",
            "/stores/search?store=adire-house",
        ]
    );
}
