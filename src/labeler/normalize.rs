/// Canonical lowercase form of free text for substring search.
///
/// Lowercases, folds common Latin diacritics to ASCII (German umlauts to
/// two letters), maps typographic quotes and dashes to their ASCII forms,
/// collapses whitespace runs to a single space and trims. `None` and `""` both normalize to `""`.
pub fn normalize(text: Option<&str>) -> String {
    let text = text.unwrap_or_default();
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        push_folded(&mut out, ch);
    }
    out
}

/// Whether `keyword` occurs in already-normalized `haystack`.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    let needle = normalize(Some(keyword));
    !needle.is_empty() && haystack.contains(&needle)
}

fn push_folded(out: &mut String, ch: char) {
    let folded = match ch {
        'ä' => "ae",
        'ö' => "oe",
        'ü' => "ue",
        'à' | 'á' | 'â' | 'ã' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => "-",
        '\u{2026}' => "...",
        _ => {
            out.push(ch);
            return;
        }
    };
    out.push_str(folded);
}
