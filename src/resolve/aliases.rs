//! Hand-maintained alias tables. A structural change in a source's naming
//! convention is a data change here, not a code change elsewhere.

/// Official API long spelling → canonical short spelling.
/// The API appends corporate designations (Saf, S.a.f., Ec, Fc) inconsistently.
pub const OFFICIAL_LONG_TO_SHORT: &[(&str, &str)] = &[
    ("Atlético Mineiro Saf", "Atlético-MG"),
    ("Bahia", "Bahia"),
    ("Botafogo", "Botafogo"),
    ("Ceará", "Ceará"),
    ("Corinthians", "Corinthians"),
    ("Cruzeiro Saf", "Cruzeiro"),
    ("Flamengo", "Flamengo"),
    ("Fluminense", "Fluminense"),
    ("Fortaleza Ec Saf", "Fortaleza"),
    ("Grêmio", "Grêmio"),
    ("Internacional", "Internacional"),
    ("Juventude", "Juventude"),
    ("Mirassol", "Mirassol"),
    ("Palmeiras", "Palmeiras"),
    ("Red Bull Bragantino", "RB Bragantino"),
    ("Santos Fc", "Santos"),
    ("São Paulo", "São Paulo"),
    ("Sport Recife", "Sport Recife"),
    ("Vasco da Gama S.a.f.", "Vasco da Gama"),
    ("Vitória", "Vitória"),
];

/// Third-party spelling → official API long spelling.
pub const THIRD_PARTY_TO_OFFICIAL: &[(&str, &str)] = &[
    ("Atlético-MG", "Atlético Mineiro Saf"),
    ("Bahia", "Bahia"),
    ("Botafogo", "Botafogo"),
    ("Ceará", "Ceará"),
    ("Corinthians", "Corinthians"),
    ("Cruzeiro", "Cruzeiro Saf"),
    ("Flamengo", "Flamengo"),
    ("Fluminense", "Fluminense"),
    ("Fortaleza", "Fortaleza Ec Saf"),
    ("Grêmio", "Grêmio"),
    ("Internacional", "Internacional"),
    ("Juventude", "Juventude"),
    ("Mirassol", "Mirassol"),
    ("Palmeiras", "Palmeiras"),
    ("RB Bragantino", "Red Bull Bragantino"),
    ("Santos", "Santos Fc"),
    ("São Paulo", "São Paulo"),
    ("Sport", "Sport Recife"),
    // Exact spelling the standings widget also uses for the same club.
    ("Sport Recife", "Sport Recife"),
    ("Vasco", "Vasco da Gama S.a.f."),
    ("Vitória", "Vitória"),
];

/// Canonical short spelling → abbreviated display form shown to consumers.
pub const SHORT_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("Atlético-MG", "Atlético-MG"),
    ("Internacional", "Inter-RS"),
    ("RB Bragantino", "Bragantino"),
    ("Sport Recife", "Sport-PE"),
    ("Vasco da Gama", "Vasco"),
];

pub fn lookup(table: &'static [(&'static str, &'static str)], raw: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == raw).map(|(_, v)| *v)
}
