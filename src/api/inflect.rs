//! English pluralization for resource names (`user` -> `users`).

const IRREGULAR: [(&str, &str); 10] = [
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
    ("quiz", "quizzes"),
];

const UNCOUNTABLE: [&str; 11] = [
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "deer",
    "news",
    "metadata",
];

const F_TO_VES: [&str; 8] = ["leaf", "half", "wolf", "shelf", "loaf", "thief", "calf", "life"];

const O_TO_OES: [&str; 5] = ["hero", "potato", "tomato", "echo", "veto"];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Pluralizes the last word of `name` (`blog_post` -> `blog_posts`).
/// Names that already look plural are returned unchanged.
pub fn pluralize(name: &str) -> String {
    let split = name.rfind(['_', '-', ' ']).map_or(0, |i| i + 1);
    let (prefix, word) = name.split_at(split);
    format!("{prefix}{}", pluralize_word(word))
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == lower) {
        return plural.to_string();
    }
    if IRREGULAR.iter().any(|(_, plural)| *plural == lower) || looks_plural(&lower) {
        return word.to_string();
    }
    if F_TO_VES.contains(&lower.as_str()) {
        let stem = word.trim_end_matches('e');
        return format!("{}ves", &stem[..stem.len() - 1]);
    }
    if O_TO_OES.contains(&lower.as_str()) {
        return format!("{word}es");
    }
    if lower.ends_with("is") {
        return format!("{}es", &word[..word.len() - 2]);
    }

    let mut chars = lower.chars().rev();
    let last = chars.next();
    let before_last = chars.next();
    match (before_last, last) {
        (Some(c), Some('y')) if !is_vowel(c) => format!("{}ies", &word[..word.len() - 1]),
        (_, Some('s' | 'x' | 'z')) => format!("{word}es"),
        (Some('s' | 'c'), Some('h')) => format!("{word}es"),
        _ => format!("{word}s"),
    }
}

fn looks_plural(lower: &str) -> bool {
    lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && !lower.ends_with("is")
}
