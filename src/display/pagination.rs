use crate::api::models::Paginated;
use crate::utils::text::clean_link_label;

/// "Showing X to Y of Z results" plus the paginator's link bar.
pub fn pagination_footer<T>(page: &Paginated<T>) -> String {
    if page.total == 0 {
        return "No records found".to_string();
    }

    let mut footer = format!(
        "Showing {} to {} of {} results",
        page.from, page.to, page.total
    );

    if !page.links.is_empty() {
        let bar: Vec<String> = page
            .links
            .iter()
            .map(|link| {
                let label = clean_link_label(&link.label);
                if link.active {
                    format!("[{}]", label)
                } else if link.url.is_none() {
                    format!("({})", label)
                } else {
                    label
                }
            })
            .collect();
        footer.push('\n');
        footer.push_str(&bar.join(" "));
    }

    footer
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_footer_with_links() {
        let page: Paginated = serde_json::from_value(json!({
            "data": [{"id": 6}],
            "links": [
                {"url": "http://api.test/x?page=1", "label": "&laquo; Previous", "active": false},
                {"url": "http://api.test/x?page=1", "label": "1", "active": false},
                {"url": "http://api.test/x?page=2", "label": "2", "active": true},
                {"url": null, "label": "Next &raquo;", "active": false}
            ],
            "from": 6,
            "to": 10,
            "total": 10
        }))
        .unwrap();

        assert_eq!(
            pagination_footer(&page),
            "Showing 6 to 10 of 10 results\n« Previous 1 [2] (Next »)"
        );
    }

    #[test]
    fn test_footer_empty() {
        let page: Paginated = serde_json::from_value(json!({"data": [], "total": 0})).unwrap();
        assert_eq!(pagination_footer(&page), "No records found");
    }
}
