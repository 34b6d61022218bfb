//! Form layout navigator.
//!
//! There is no per-node GET on the layout endpoints; reading a single page,
//! group, or control means fetching the work-item type with its layout
//! expanded and walking the tree. The finders return detached clones so
//! callers never alias into the fetched layout, and empty child vectors are
//! simply no-match.

use azdoapi::models::process::{Control, FormLayout, Group, Page};

/// A group together with the page and section that contain it.
#[derive(Debug, Clone)]
pub struct FoundGroup {
    pub group: Group,
    pub page_id: String,
    pub section_id: String,
}

/// A control together with the group that contains it.
#[derive(Debug, Clone)]
pub struct FoundControl {
    pub control: Control,
    pub group_id: String,
}

pub fn find_page(layout: &FormLayout, page_id: &str) -> Option<Page> {
    layout
        .pages
        .iter()
        .find(|p| p.id.as_deref() == Some(page_id))
        .cloned()
}

pub fn find_group(layout: &FormLayout, group_id: &str) -> Option<FoundGroup> {
    for page in &layout.pages {
        for section in &page.sections {
            for group in &section.groups {
                if group.id.as_deref() == Some(group_id) {
                    return Some(FoundGroup {
                        group: group.clone(),
                        page_id: page.id.clone().unwrap_or_default(),
                        section_id: section.id.clone(),
                    });
                }
            }
        }
    }
    None
}

pub fn find_control(layout: &FormLayout, control_id: &str) -> Option<FoundControl> {
    for page in &layout.pages {
        for section in &page.sections {
            for group in &section.groups {
                for control in &group.controls {
                    if control.id.as_deref() == Some(control_id) {
                        return Some(FoundControl {
                            control: control.clone(),
                            group_id: group.id.clone().unwrap_or_default(),
                        });
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::models::process::Section;

    fn sample_layout() -> FormLayout {
        FormLayout {
            pages: vec![
                Page {
                    id: Some("page-1".to_string()),
                    label: Some("Details".to_string()),
                    page_type: Some("custom".to_string()),
                    order: Some(0),
                    visible: Some(true),
                    locked: None,
                    inherited: Some(true),
                    overridden: None,
                    sections: vec![Section {
                        id: "Section1".to_string(),
                        overridden: None,
                        groups: vec![Group {
                            id: Some("g1".to_string()),
                            label: Some("Planning".to_string()),
                            order: Some(0),
                            visible: Some(true),
                            inherited: Some(true),
                            overridden: None,
                            controls: vec![Control {
                                id: Some("System.Title".to_string()),
                                label: Some("Title".to_string()),
                                ..Control::default()
                            }],
                        }],
                    }],
                },
                Page {
                    id: Some("page-2".to_string()),
                    label: Some("Extra".to_string()),
                    page_type: Some("custom".to_string()),
                    order: Some(1),
                    visible: Some(true),
                    locked: None,
                    inherited: None,
                    overridden: None,
                    // A page fresh from AddPage can have no sections yet.
                    sections: Vec::new(),
                },
            ],
            system_controls: Vec::new(),
        }
    }

    #[test]
    fn finds_every_node_in_the_tree() {
        let layout = sample_layout();
        assert!(find_page(&layout, "page-1").is_some());
        assert!(find_page(&layout, "page-2").is_some());

        let group = find_group(&layout, "g1").unwrap();
        assert_eq!(group.page_id, "page-1");
        assert_eq!(group.section_id, "Section1");

        let control = find_control(&layout, "System.Title").unwrap();
        assert_eq!(control.group_id, "g1");
        assert_eq!(control.control.label.as_deref(), Some("Title"));
    }

    #[test]
    fn missing_nodes_and_empty_children_are_no_match() {
        let layout = sample_layout();
        assert!(find_page(&layout, "page-9").is_none());
        assert!(find_group(&layout, "g9").is_none());
        assert!(find_control(&layout, "System.Reason").is_none());
        assert!(find_group(&FormLayout::default(), "g1").is_none());
    }

    #[test]
    fn output_is_detached_from_the_layout() {
        let layout = sample_layout();
        let mut found = find_control(&layout, "System.Title").unwrap();
        found.control.label = Some("Renamed".to_string());
        assert_eq!(
            find_control(&layout, "System.Title").unwrap().control.label.as_deref(),
            Some("Title")
        );
    }
}
