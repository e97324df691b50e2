//! Country classification for channel records.
//!
//! Channels carry no explicit country field upstream, so we infer one from
//! the xmltv id and the provider directory name. Matching is ordered, first
//! hit wins.

/// Ordered suffix table. Earlier entries take precedence.
pub const COUNTRY_SUFFIXES: &[(&str, &str)] = &[
    (".us", "United States"),
    (".uk", "United Kingdom"),
    (".ca", "Canada"),
    (".au", "Australia"),
    (".de", "Germany"),
    (".fr", "France"),
    (".es", "Spain"),
    (".it", "Italy"),
    (".nl", "Netherlands"),
    (".br", "Brazil"),
    (".mx", "Mexico"),
    (".ar", "Argentina"),
    (".in", "India"),
    (".jp", "Japan"),
    (".kr", "South Korea"),
    (".cn", "China"),
    (".ru", "Russia"),
    (".se", "Sweden"),
    (".no", "Norway"),
    (".dk", "Denmark"),
    (".fi", "Finland"),
    (".pl", "Poland"),
    (".tr", "Turkey"),
    (".za", "South Africa"),
    (".nz", "New Zealand"),
    (".ie", "Ireland"),
    (".pt", "Portugal"),
    (".gr", "Greece"),
    (".ch", "Switzerland"),
    (".at", "Austria"),
    (".be", "Belgium"),
    (".cz", "Czech Republic"),
    (".ro", "Romania"),
    (".hu", "Hungary"),
    (".il", "Israel"),
    (".ae", "United Arab Emirates"),
    (".sg", "Singapore"),
    (".th", "Thailand"),
    (".my", "Malaysia"),
    (".id", "Indonesia"),
    (".ph", "Philippines"),
    (".vn", "Vietnam"),
];

/// Infer a display country from an xmltv id and the provider site name.
///
/// First pass checks the lowercased xmltv id for a dotted suffix like
/// `.us`. Second pass checks the site name for the bare country code,
/// case sensitively. Unmatched channels are classified `International`.
pub fn detect_country(xmltv_id: &str, site_name: &str) -> &'static str {
    let id = xmltv_id.to_lowercase();
    for (suffix, country) in COUNTRY_SUFFIXES {
        if id.contains(suffix) {
            return country;
        }
    }

    for (suffix, country) in COUNTRY_SUFFIXES {
        if site_name.contains(&suffix[1..]) {
            return country;
        }
    }

    "International"
}
