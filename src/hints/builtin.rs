//! Hints for calendar sites whose structure is known ahead of time.

use super::{HintField, HintRegistry, HintStrategy, SiteHint};

const NEXT_JS_DOMAINS: [&str; 4] = [
    "formula1.com",
    "fiaformula2.com",
    "fiaformula3.com",
    "f1academy.com",
];

const SRO_DOMAINS: [&str; 4] = [
    "gt-world-challenge-europe.com",
    "gt-world-challenge-america.com",
    "gt-world-challenge-asia.com",
    "intercontinentalgtchallenge.com",
];

/// Builds the registry of built-in site hints.
#[must_use]
pub fn build_default_hint_registry() -> HintRegistry {
    let mut registry = HintRegistry::new();

    registry.register(
        SiteHint::new("fiaformulae.com", HintStrategy::Api)
            .with_api_url("https://api.formula-e.pulselive.com/formula-e/v1/races")
            .with_aliases(HintField::Events, &["races", "events"])
            .with_aliases(HintField::Name, &["city", "raceName", "name"])
            .with_aliases(HintField::Start, &["date", "raceDate"])
            .with_aliases(HintField::Sessions, &["sessions", "timetable"])
            .with_ai_context(
                "Formula E uses PulseLive API. Sessions are often in 'sessions' or 'timetable' array.",
            ),
    );

    // The feed URL depends on series and season ids, so only capture patterns are known.
    registry.register(
        SiteHint::new("nascar.com", HintStrategy::Api)
            .with_network_patterns(&["race_list_basic.json", "schedule-feed.json"])
            .with_ai_context(
                "NASCAR data is typically in JSON feeds. Look for run_type: 1=Practice, 2=Quali, 3=Race.",
            )
            .with_timezone("America/New_York"),
    );

    for domain in NEXT_JS_DOMAINS {
        registry.register(
            SiteHint::new(domain, HintStrategy::NextData)
                .with_aliases(HintField::Events, &["Races", "Events", "races"])
                .with_aliases(HintField::Name, &["RaceName", "CircuitShortName", "Name"])
                .with_aliases(HintField::Start, &["RaceStartDate", "Date", "StartDate"])
                .with_aliases(HintField::Sessions, &["Sessions", "Timetable"])
                .with_ai_context("Modern Next.js site. Check __NEXT_DATA__ script tag for full props."),
        );
    }

    registry.register(
        SiteHint::new("indycar.com", HintStrategy::Auto)
            .with_network_patterns(&["schedules", "race-control"])
            .with_ai_context("IndyCar schedule often in list items. Look for 'Race Control' links.")
            .with_timezone("America/New_York"),
    );

    registry.register(
        SiteHint::new("fiawec.com", HintStrategy::Playwright)
            .with_ai_context("FIA WEC: Events are in cards. Dates often span multiple days.")
            .with_timezone("Europe/Paris"),
    );

    registry.register(
        SiteHint::new("wrc.com", HintStrategy::Playwright).with_ai_context(
            "WRC is an SPA. Events might be in grid cards. Dates are usually ranges.",
        ),
    );

    registry.register(
        SiteHint::new("imsa.com", HintStrategy::Playwright)
            .with_ai_context(
                "IMSA: Protected by Cloudflare. Look for 'WeatherTech Championship' events.",
            )
            .with_timezone("America/New_York"),
    );

    registry.register(
        SiteHint::new("supercars.com", HintStrategy::Playwright)
            .with_ai_context(
                "Supercars: Australian text formats. Look for 'Race' vs 'SuperSprint'.",
            )
            .with_timezone("Australia/Sydney"),
    );

    registry.register(
        SiteHint::new("btcc.net", HintStrategy::Playwright)
            .with_ai_context("BTCC: UK based. 3 races per weekend. Look for 'Rounds'.")
            .with_timezone("Europe/London"),
    );

    registry.register(
        SiteHint::new("superformula.net", HintStrategy::Playwright)
            .without_tls_verification()
            .with_ai_context("Super Formula: Japanese site. Dates might use YYYY.MM.DD format.")
            .with_timezone("Asia/Tokyo"),
    );

    for domain in SRO_DOMAINS {
        registry.register(
            SiteHint::new(domain, HintStrategy::Playwright).with_ai_context(
                "SRO Site: Events in calendar grid. Click event for timetable/sessions.",
            ),
        );
    }

    registry
}
