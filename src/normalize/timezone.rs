//! Location to IANA timezone lookup.

/// Resolves a country code, country name or city to an IANA timezone.
pub trait TimezoneLookup: Send + Sync {
    /// Returns the timezone for `location`, or `None` when unknown.
    fn timezone_for(&self, location: &str) -> Option<String>;
}

/// Built-in table covering the countries and venues on current championship calendars.
///
/// Countries spanning several zones map to the zone of their main circuit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountryTimezones;

impl CountryTimezones {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// `(ISO 3166 alpha-2, country name, timezone)`.
const COUNTRIES: &[(&str, &str, &str)] = &[
    ("AE", "United Arab Emirates", "Asia/Dubai"),
    ("AR", "Argentina", "America/Argentina/Buenos_Aires"),
    ("AT", "Austria", "Europe/Vienna"),
    ("AU", "Australia", "Australia/Melbourne"),
    ("AZ", "Azerbaijan", "Asia/Baku"),
    ("BE", "Belgium", "Europe/Brussels"),
    ("BH", "Bahrain", "Asia/Bahrain"),
    ("BR", "Brazil", "America/Sao_Paulo"),
    ("CA", "Canada", "America/Toronto"),
    ("CH", "Switzerland", "Europe/Zurich"),
    ("CL", "Chile", "America/Santiago"),
    ("CN", "China", "Asia/Shanghai"),
    ("CZ", "Czech Republic", "Europe/Prague"),
    ("DE", "Germany", "Europe/Berlin"),
    ("DK", "Denmark", "Europe/Copenhagen"),
    ("EE", "Estonia", "Europe/Tallinn"),
    ("ES", "Spain", "Europe/Madrid"),
    ("FI", "Finland", "Europe/Helsinki"),
    ("FR", "France", "Europe/Paris"),
    ("GB", "United Kingdom", "Europe/London"),
    ("GR", "Greece", "Europe/Athens"),
    ("HR", "Croatia", "Europe/Zagreb"),
    ("HU", "Hungary", "Europe/Budapest"),
    ("ID", "Indonesia", "Asia/Makassar"),
    ("IN", "India", "Asia/Kolkata"),
    ("IT", "Italy", "Europe/Rome"),
    ("JP", "Japan", "Asia/Tokyo"),
    ("KE", "Kenya", "Africa/Nairobi"),
    ("KR", "South Korea", "Asia/Seoul"),
    ("LV", "Latvia", "Europe/Riga"),
    ("MA", "Morocco", "Africa/Casablanca"),
    ("MC", "Monaco", "Europe/Monaco"),
    ("MX", "Mexico", "America/Mexico_City"),
    ("MY", "Malaysia", "Asia/Kuala_Lumpur"),
    ("NL", "Netherlands", "Europe/Amsterdam"),
    ("NO", "Norway", "Europe/Oslo"),
    ("NZ", "New Zealand", "Pacific/Auckland"),
    ("PL", "Poland", "Europe/Warsaw"),
    ("PT", "Portugal", "Europe/Lisbon"),
    ("QA", "Qatar", "Asia/Qatar"),
    ("SA", "Saudi Arabia", "Asia/Riyadh"),
    ("SE", "Sweden", "Europe/Stockholm"),
    ("SG", "Singapore", "Asia/Singapore"),
    ("TH", "Thailand", "Asia/Bangkok"),
    ("TR", "Turkey", "Europe/Istanbul"),
    ("US", "United States", "America/New_York"),
    ("ZA", "South Africa", "Africa/Johannesburg"),
];

/// Alternate country spellings seen in calendar feeds.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("uae", "AE"),
    ("abu dhabi", "AE"),
    ("great britain", "GB"),
    ("uk", "GB"),
    ("england", "GB"),
    ("usa", "US"),
    ("united states of america", "US"),
    ("czechia", "CZ"),
    ("korea", "KR"),
    ("türkiye", "TR"),
];

/// City and circuit names whose zone differs from their country default.
const CITIES: &[(&str, &str)] = &[
    ("indianapolis", "America/Indiana/Indianapolis"),
    ("detroit", "America/Detroit"),
    ("long beach", "America/Los_Angeles"),
    ("laguna seca", "America/Los_Angeles"),
    ("monterey", "America/Los_Angeles"),
    ("sonoma", "America/Los_Angeles"),
    ("portland", "America/Los_Angeles"),
    ("las vegas", "America/Los_Angeles"),
    ("phoenix", "America/Phoenix"),
    ("austin", "America/Chicago"),
    ("nashville", "America/Chicago"),
    ("milwaukee", "America/Chicago"),
    ("road america", "America/Chicago"),
    ("miami", "America/New_York"),
    ("st. petersburg", "America/New_York"),
    ("daytona", "America/New_York"),
    ("sebring", "America/New_York"),
    ("montreal", "America/Toronto"),
    ("toronto", "America/Toronto"),
    ("edmonton", "America/Edmonton"),
    ("adelaide", "Australia/Adelaide"),
    ("melbourne", "Australia/Melbourne"),
    ("phillip island", "Australia/Melbourne"),
    ("bathurst", "Australia/Sydney"),
    ("sydney", "Australia/Sydney"),
    ("perth", "Australia/Perth"),
    ("darwin", "Australia/Darwin"),
    ("townsville", "Australia/Brisbane"),
    ("gold coast", "Australia/Brisbane"),
    ("sakhir", "Asia/Bahrain"),
    ("jeddah", "Asia/Riyadh"),
    ("lusail", "Asia/Qatar"),
    ("yas marina", "Asia/Dubai"),
    ("silverstone", "Europe/London"),
    ("monza", "Europe/Rome"),
    ("imola", "Europe/Rome"),
    ("mugello", "Europe/Rome"),
    ("spa", "Europe/Brussels"),
    ("spa-francorchamps", "Europe/Brussels"),
    ("spielberg", "Europe/Vienna"),
    ("zandvoort", "Europe/Amsterdam"),
    ("assen", "Europe/Amsterdam"),
    ("le mans", "Europe/Paris"),
    ("monte carlo", "Europe/Monaco"),
    ("budapest", "Europe/Budapest"),
    ("barcelona", "Europe/Madrid"),
    ("madrid", "Europe/Madrid"),
    ("jerez", "Europe/Madrid"),
    ("portimao", "Europe/Lisbon"),
    ("mexico city", "America/Mexico_City"),
    ("sao paulo", "America/Sao_Paulo"),
    ("são paulo", "America/Sao_Paulo"),
    ("interlagos", "America/Sao_Paulo"),
    ("suzuka", "Asia/Tokyo"),
    ("fuji", "Asia/Tokyo"),
    ("motegi", "Asia/Tokyo"),
    ("shanghai", "Asia/Shanghai"),
    ("baku", "Asia/Baku"),
    ("marina bay", "Asia/Singapore"),
    ("sepang", "Asia/Kuala_Lumpur"),
    ("mandalika", "Asia/Makassar"),
    ("buriram", "Asia/Bangkok"),
    ("diriyah", "Asia/Riyadh"),
];

impl TimezoneLookup for CountryTimezones {
    fn timezone_for(&self, location: &str) -> Option<String> {
        let query = location.trim();
        if query.is_empty() {
            return None;
        }

        if query.len() == 2 {
            let code = query.to_ascii_uppercase();
            if let Some((_, _, zone)) = COUNTRIES.iter().find(|(c, _, _)| *c == code) {
                return Some((*zone).to_string());
            }
        }

        let lowered = query.to_lowercase();
        if let Some((_, _, zone)) = COUNTRIES
            .iter()
            .find(|(_, name, _)| name.to_lowercase() == lowered)
        {
            return Some((*zone).to_string());
        }
        if let Some((_, code)) = COUNTRY_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
            return self.timezone_for(code);
        }
        CITIES
            .iter()
            .find(|(city, _)| *city == lowered)
            .map(|(_, zone)| (*zone).to_string())
    }
}
