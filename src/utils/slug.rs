use once_cell::sync::Lazy;
use regex::Regex;

static VALID_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+(?:-[a-z0-9_]+)*$").expect("slug pattern is valid"));

const MAX_SLUG_LEN: usize = 50;

/// 从分组标题生成 slug
pub fn generate_slug(title: &str) -> String {
    let mut slug = slug::slugify(title);

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        // 尽量在单词边界截断
        if let Some(last_hyphen) = slug.rfind('-') {
            if last_hyphen > MAX_SLUG_LEN / 2 {
                slug.truncate(last_hyphen);
            }
        }
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        slug = "group".to_string();
    }

    slug
}

/// 已存在时追加数字后缀
pub fn make_slug_unique(base_slug: &str, existing_slugs: &[String]) -> String {
    let mut slug = base_slug.to_string();
    let mut counter = 1;

    while existing_slugs.contains(&slug) {
        slug = format!("{}-{}", base_slug, counter);
        counter += 1;
    }

    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slug.len() <= MAX_SLUG_LEN && VALID_SLUG.is_match(slug)
}
