use api_types::category::{Category, CategoryNew, CategoryUpdate};

use crate::store::{CrudStore, Resource};

pub const DEFAULT_CATEGORY_LOCKED: &str = "Default categories cannot be deleted";
pub const DEFAULT_CATEGORY_RENAME: &str =
    "This is a default category. You can only change the icon.";

const NAME_REQUIRED: &str = "Please enter a category name";
const ICON_REQUIRED: &str = "Please select an icon";
const ICON_INVALID: &str = "Please enter a valid emoji (e.g., 😎, 🍔, 🏠)";

pub type CategoryStore = CrudStore<Category>;

impl Resource for Category {
    type New = CategoryNew;
    type Patch = CategoryUpdate;

    const PATH: &'static str = "/api/category";
    const NOUN: &'static str = "Category";
    const PLURAL: &'static str = "categories";

    fn id(&self) -> &str {
        &self.id
    }

    fn check_new(data: &CategoryNew) -> Result<(), String> {
        check_name(&data.name)?;
        check_icon(&data.icon)
    }

    fn check_patch(current: Option<&Self>, patch: &CategoryUpdate) -> Result<(), String> {
        if let Some(name) = &patch.name {
            check_name(name)?;
            if let Some(current) = current.filter(|c| !c.editable) {
                if current.name != name.trim() {
                    return Err(DEFAULT_CATEGORY_RENAME.to_string());
                }
            }
        }
        if let Some(icon) = &patch.icon {
            check_icon(icon)?;
        }
        Ok(())
    }

    fn check_delete(current: Option<&Self>) -> Result<(), String> {
        match current {
            Some(category) if !category.editable => Err(DEFAULT_CATEGORY_LOCKED.to_string()),
            _ => Ok(()),
        }
    }
}

fn check_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(NAME_REQUIRED.to_string());
    }
    Ok(())
}

fn check_icon(icon: &str) -> Result<(), String> {
    let icon = icon.trim();
    if icon.is_empty() {
        return Err(ICON_REQUIRED.to_string());
    }
    if !is_single_emoji(icon) {
        return Err(ICON_INVALID.to_string());
    }
    Ok(())
}

/// Case-insensitive name filter over a category list.
pub fn search_categories<'a>(categories: &'a [Category], query: &str) -> Vec<&'a Category> {
    let query = query.trim().to_lowercase();
    categories
        .iter()
        .filter(|category| query.is_empty() || category.name.to_lowercase().contains(&query))
        .collect()
}

const ZWJ: char = '\u{200D}';
const VS16: char = '\u{FE0F}';
const KEYCAP: char = '\u{20E3}';
const CANCEL_TAG: char = '\u{E007F}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_skin_tone(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_tag(c: char) -> bool {
    ('\u{E0020}'..='\u{E007F}').contains(&c)
}

fn is_pictographic(c: char) -> bool {
    if is_regional_indicator(c) {
        return false;
    }
    matches!(
        c,
        '\u{00A9}'
            | '\u{00AE}'
            | '\u{203C}'
            | '\u{2049}'
            | '\u{2122}'
            | '\u{2139}'
            | '\u{2190}'..='\u{21FF}'
            | '\u{2300}'..='\u{23FF}'
            | '\u{24C2}'
            | '\u{25AA}'..='\u{25FE}'
            | '\u{2600}'..='\u{27BF}'
            | '\u{2934}'..='\u{2935}'
            | '\u{2B00}'..='\u{2BFF}'
            | '\u{3030}'
            | '\u{303D}'
            | '\u{3297}'
            | '\u{3299}'
            | '\u{1F000}'..='\u{1FAFF}'
    )
}

/// One pictographic base with its optional presentation selector or skin
/// tone, and an optional tag sequence. Returns what follows it.
fn emoji_element(chars: &[char]) -> Option<&[char]> {
    let (first, mut rest) = chars.split_first()?;
    if !is_pictographic(*first) {
        return None;
    }
    if let [modifier, tail @ ..] = rest {
        if *modifier == VS16 || is_skin_tone(*modifier) {
            rest = tail;
        }
    }
    let tags = rest.iter().take_while(|c| is_tag(**c)).count();
    if tags > 0 {
        if rest[tags - 1] != CANCEL_TAG {
            return None;
        }
        rest = &rest[tags..];
    }
    Some(rest)
}

/// `true` when `input` is exactly one emoji: a pictograph (optionally
/// modified), a flag, a keycap, or a zero-width-joiner sequence of those.
pub fn is_single_emoji(input: &str) -> bool {
    let chars: Vec<char> = input.trim().chars().collect();
    match chars.as_slice() {
        [] => return false,
        [a, b] if is_regional_indicator(*a) && is_regional_indicator(*b) => return true,
        [base, VS16, KEYCAP] | [base, KEYCAP] if matches!(*base, '0'..='9' | '#' | '*') => {
            return true;
        }
        _ => {}
    }

    let mut rest = chars.as_slice();
    loop {
        let Some(after) = emoji_element(rest) else {
            return false;
        };
        match after {
            [] => return true,
            [ZWJ, tail @ ..] => rest = tail,
            _ => return false,
        }
    }
}
