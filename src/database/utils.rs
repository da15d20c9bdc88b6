use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?").expect("placeholder pattern is valid"));

/// Collapse whitespace and rewrite `?` placeholders to PostgreSQL's `$n`
pub fn sql(query: &str) -> String {
    let cleaned = query.split_whitespace().collect::<Vec<&str>>().join(" ");
    let mut param_index = 0;
    PLACEHOLDER
        .replace_all(&cleaned, |_: &regex::Captures| {
            param_index += 1;
            format!("${}", param_index)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrites_placeholders_in_order() {
        let query = sql(r#"
            SELECT id
            FROM   tasks
            WHERE  user_id = ?
              AND  project_id = ?
        "#);
        assert_eq!(
            query,
            "SELECT id FROM tasks WHERE user_id = $1 AND project_id = $2"
        );
    }

    #[test]
    fn leaves_queries_without_placeholders_alone() {
        assert_eq!(sql("SELECT COUNT(*) FROM users"), "SELECT COUNT(*) FROM users");
    }
}
