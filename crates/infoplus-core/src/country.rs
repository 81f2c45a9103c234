//! # Country & State Naming
//!
//! InfoPlus stores countries as upper-case free text and US states by full
//! name. Local addresses carry ISO codes. Both lookups are total: they never
//! fail and never return an empty country.
//!
//! - Unknown country code → `"GERMANY"`
//! - Unknown state code → `""`
//! - States are only resolved for `"UNITED STATES"`

/// Country used when an ISO code is not in the table.
pub const FALLBACK_COUNTRY: &str = "GERMANY";

/// The only country whose state codes are translated.
pub const UNITED_STATES: &str = "UNITED STATES";

const COUNTRIES: &[(&str, &str)] = &[
    ("AD", "ANDORRA"),
    ("AE", "UNITED ARAB EMIRATES"),
    ("AF", "AFGHANISTAN"),
    ("AG", "ANTIGUA AND BARBUDA"),
    ("AI", "ANGUILLA"),
    ("AL", "ALBANIA"),
    ("AM", "ARMENIA"),
    ("AO", "ANGOLA"),
    ("AR", "ARGENTINA"),
    ("AS", "AMERICAN SAMOA"),
    ("AT", "AUSTRIA"),
    ("AU", "AUSTRALIA"),
    ("AW", "ARUBA"),
    ("AZ", "AZERBAIJAN"),
    ("BA", "BOSNIA AND HERZEGOVINA"),
    ("BB", "BARBADOS"),
    ("BD", "BANGLADESH"),
    ("BE", "BELGIUM"),
    ("BF", "BURKINA FASO"),
    ("BG", "BULGARIA"),
    ("BH", "BAHRAIN"),
    ("BI", "BURUNDI"),
    ("BJ", "BENIN"),
    ("BM", "BERMUDA"),
    ("BN", "BRUNEI DARUSSALAM"),
    ("BO", "BOLIVIA"),
    ("BR", "BRAZIL"),
    ("BS", "BAHAMAS"),
    ("BT", "BHUTAN"),
    ("BW", "BOTSWANA"),
    ("BY", "BELARUS"),
    ("BZ", "BELIZE"),
    ("CA", "CANADA"),
    ("CD", "CONGO, THE DEMOCRATIC REPUBLIC OF THE"),
    ("CF", "CENTRAL AFRICAN REPUBLIC"),
    ("CG", "CONGO"),
    ("CH", "SWITZERLAND"),
    ("CI", "COTE D'IVOIRE"),
    ("CK", "COOK ISLANDS"),
    ("CL", "CHILE"),
    ("CM", "CAMEROON"),
    ("CN", "CHINA"),
    ("CO", "COLOMBIA"),
    ("CR", "COSTA RICA"),
    ("CU", "CUBA"),
    ("CV", "CAPE VERDE"),
    ("CW", "CURACAO"),
    ("CY", "CYPRUS"),
    ("CZ", "CZECH REPUBLIC"),
    ("DE", "GERMANY"),
    ("DJ", "DJIBOUTI"),
    ("DK", "DENMARK"),
    ("DM", "DOMINICA"),
    ("DO", "DOMINICAN REPUBLIC"),
    ("DZ", "ALGERIA"),
    ("EC", "ECUADOR"),
    ("EE", "ESTONIA"),
    ("EG", "EGYPT"),
    ("ER", "ERITREA"),
    ("ES", "SPAIN"),
    ("ET", "ETHIOPIA"),
    ("FI", "FINLAND"),
    ("FJ", "FIJI"),
    ("FK", "FALKLAND ISLANDS (MALVINAS)"),
    ("FM", "MICRONESIA, FEDERATED STATES OF"),
    ("FO", "FAROE ISLANDS"),
    ("FR", "FRANCE"),
    ("GA", "GABON"),
    ("GB", "UNITED KINGDOM"),
    ("GD", "GRENADA"),
    ("GE", "GEORGIA"),
    ("GF", "FRENCH GUIANA"),
    ("GG", "GUERNSEY"),
    ("GH", "GHANA"),
    ("GI", "GIBRALTAR"),
    ("GL", "GREENLAND"),
    ("GM", "GAMBIA"),
    ("GN", "GUINEA"),
    ("GP", "GUADELOUPE"),
    ("GQ", "EQUATORIAL GUINEA"),
    ("GR", "GREECE"),
    ("GT", "GUATEMALA"),
    ("GU", "GUAM"),
    ("GW", "GUINEA-BISSAU"),
    ("GY", "GUYANA"),
    ("HK", "HONG KONG"),
    ("HN", "HONDURAS"),
    ("HR", "CROATIA"),
    ("HT", "HAITI"),
    ("HU", "HUNGARY"),
    ("ID", "INDONESIA"),
    ("IE", "IRELAND"),
    ("IL", "ISRAEL"),
    ("IM", "ISLE OF MAN"),
    ("IN", "INDIA"),
    ("IQ", "IRAQ"),
    ("IR", "IRAN, ISLAMIC REPUBLIC OF"),
    ("IS", "ICELAND"),
    ("IT", "ITALY"),
    ("JE", "JERSEY"),
    ("JM", "JAMAICA"),
    ("JO", "JORDAN"),
    ("JP", "JAPAN"),
    ("KE", "KENYA"),
    ("KG", "KYRGYZSTAN"),
    ("KH", "CAMBODIA"),
    ("KI", "KIRIBATI"),
    ("KM", "COMOROS"),
    ("KN", "SAINT KITTS AND NEVIS"),
    ("KP", "KOREA, DEMOCRATIC PEOPLE'S REPUBLIC OF"),
    ("KR", "KOREA, REPUBLIC OF"),
    ("KW", "KUWAIT"),
    ("KY", "CAYMAN ISLANDS"),
    ("KZ", "KAZAKHSTAN"),
    ("LA", "LAO PEOPLE'S DEMOCRATIC REPUBLIC"),
    ("LB", "LEBANON"),
    ("LC", "SAINT LUCIA"),
    ("LI", "LIECHTENSTEIN"),
    ("LK", "SRI LANKA"),
    ("LR", "LIBERIA"),
    ("LS", "LESOTHO"),
    ("LT", "LITHUANIA"),
    ("LU", "LUXEMBOURG"),
    ("LV", "LATVIA"),
    ("LY", "LIBYA"),
    ("MA", "MOROCCO"),
    ("MC", "MONACO"),
    ("MD", "MOLDOVA, REPUBLIC OF"),
    ("ME", "MONTENEGRO"),
    ("MG", "MADAGASCAR"),
    ("MH", "MARSHALL ISLANDS"),
    ("MK", "NORTH MACEDONIA"),
    ("ML", "MALI"),
    ("MM", "MYANMAR"),
    ("MN", "MONGOLIA"),
    ("MO", "MACAO"),
    ("MQ", "MARTINIQUE"),
    ("MR", "MAURITANIA"),
    ("MS", "MONTSERRAT"),
    ("MT", "MALTA"),
    ("MU", "MAURITIUS"),
    ("MV", "MALDIVES"),
    ("MW", "MALAWI"),
    ("MX", "MEXICO"),
    ("MY", "MALAYSIA"),
    ("MZ", "MOZAMBIQUE"),
    ("NA", "NAMIBIA"),
    ("NC", "NEW CALEDONIA"),
    ("NE", "NIGER"),
    ("NG", "NIGERIA"),
    ("NI", "NICARAGUA"),
    ("NL", "NETHERLANDS"),
    ("NO", "NORWAY"),
    ("NP", "NEPAL"),
    ("NR", "NAURU"),
    ("NZ", "NEW ZEALAND"),
    ("OM", "OMAN"),
    ("PA", "PANAMA"),
    ("PE", "PERU"),
    ("PF", "FRENCH POLYNESIA"),
    ("PG", "PAPUA NEW GUINEA"),
    ("PH", "PHILIPPINES"),
    ("PK", "PAKISTAN"),
    ("PL", "POLAND"),
    ("PR", "PUERTO RICO"),
    ("PS", "PALESTINE, STATE OF"),
    ("PT", "PORTUGAL"),
    ("PW", "PALAU"),
    ("PY", "PARAGUAY"),
    ("QA", "QATAR"),
    ("RE", "REUNION"),
    ("RO", "ROMANIA"),
    ("RS", "SERBIA"),
    ("RU", "RUSSIAN FEDERATION"),
    ("RW", "RWANDA"),
    ("SA", "SAUDI ARABIA"),
    ("SB", "SOLOMON ISLANDS"),
    ("SC", "SEYCHELLES"),
    ("SD", "SUDAN"),
    ("SE", "SWEDEN"),
    ("SG", "SINGAPORE"),
    ("SI", "SLOVENIA"),
    ("SK", "SLOVAKIA"),
    ("SL", "SIERRA LEONE"),
    ("SM", "SAN MARINO"),
    ("SN", "SENEGAL"),
    ("SO", "SOMALIA"),
    ("SR", "SURINAME"),
    ("SS", "SOUTH SUDAN"),
    ("ST", "SAO TOME AND PRINCIPE"),
    ("SV", "EL SALVADOR"),
    ("SX", "SINT MAARTEN"),
    ("SY", "SYRIAN ARAB REPUBLIC"),
    ("SZ", "ESWATINI"),
    ("TC", "TURKS AND CAICOS ISLANDS"),
    ("TD", "CHAD"),
    ("TG", "TOGO"),
    ("TH", "THAILAND"),
    ("TJ", "TAJIKISTAN"),
    ("TL", "TIMOR-LESTE"),
    ("TM", "TURKMENISTAN"),
    ("TN", "TUNISIA"),
    ("TO", "TONGA"),
    ("TR", "TURKEY"),
    ("TT", "TRINIDAD AND TOBAGO"),
    ("TV", "TUVALU"),
    ("TW", "TAIWAN"),
    ("TZ", "TANZANIA, UNITED REPUBLIC OF"),
    ("UA", "UKRAINE"),
    ("UG", "UGANDA"),
    ("US", "UNITED STATES"),
    ("UY", "URUGUAY"),
    ("UZ", "UZBEKISTAN"),
    ("VA", "HOLY SEE (VATICAN CITY STATE)"),
    ("VC", "SAINT VINCENT AND THE GRENADINES"),
    ("VE", "VENEZUELA"),
    ("VG", "VIRGIN ISLANDS, BRITISH"),
    ("VI", "VIRGIN ISLANDS, U.S."),
    ("VN", "VIET NAM"),
    ("VU", "VANUATU"),
    ("WS", "SAMOA"),
    ("YE", "YEMEN"),
    ("YT", "MAYOTTE"),
    ("ZA", "SOUTH AFRICA"),
    ("ZM", "ZAMBIA"),
    ("ZW", "ZIMBABWE"),
];

const US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Maps an ISO-3166 alpha-2 code to the InfoPlus country name.
///
/// Case-insensitive; surrounding whitespace is ignored.
pub fn map_country(iso_code: &str) -> &'static str {
    let code = iso_code.trim().to_ascii_uppercase();
    COUNTRIES
        .iter()
        .find(|(iso, _)| *iso == code)
        .map(|(_, name)| *name)
        .unwrap_or(FALLBACK_COUNTRY)
}

/// Maps a US state code to its full name.
///
/// `country` is the already-resolved InfoPlus country name. Accepts both
/// `"CA"` and `"US-CA"`.
pub fn map_us_state(country: &str, state_code: &str) -> &'static str {
    if country != UNITED_STATES {
        return "";
    }
    let code = state_code.trim().to_ascii_uppercase();
    let code = code.strip_prefix("US-").unwrap_or(&code);
    US_STATES
        .iter()
        .find(|(iso, _)| *iso == code)
        .map(|(_, name)| *name)
        .unwrap_or("")
}
