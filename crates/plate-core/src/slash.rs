use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::blocks::ListKind;
use crate::callout::CalloutType;
use crate::core::{Editor, Selection};
use crate::edit::Draft;
use crate::error::EditError;

pub const DEFAULT_CATEGORY: &str = "Other";
pub const EMPTY_MESSAGE: &str = "No matching commands";

/// What a catalog entry does once picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "arg", rename_all = "snake_case")]
pub enum BlockCommand {
    Callout(CalloutType),
    Heading(u8),
    List(ListKind),
    Blockquote,
    CodeBlock,
    HorizontalRule,
}

impl BlockCommand {
    pub fn id(self) -> &'static str {
        match self {
            BlockCommand::Callout(_) => "slash.callout",
            BlockCommand::Heading(_) => "slash.heading",
            BlockCommand::List(_) => "slash.list",
            BlockCommand::Blockquote => "slash.blockquote",
            BlockCommand::CodeBlock => "slash.code_block",
            BlockCommand::HorizontalRule => "slash.horizontal_rule",
        }
    }

    fn run(self, draft: &mut Draft<'_>) -> Result<(), EditError> {
        match self {
            BlockCommand::Callout(callout_type) => draft.set_callout(callout_type),
            BlockCommand::Heading(level) => draft.set_heading(level),
            BlockCommand::List(list) => draft.toggle_list(list),
            BlockCommand::Blockquote => draft.toggle_blockquote(),
            BlockCommand::CodeBlock => draft.toggle_code_block(),
            BlockCommand::HorizontalRule => draft.insert_horizontal_rule(),
        }
    }

    /// Deletes `range` (the typed trigger text) and runs the command at the
    /// caret left behind, as one undo step.
    pub fn apply(self, editor: &mut Editor, range: Range<usize>) -> Result<(), EditError> {
        tracing::debug!(command = self.id(), ?range, "applying block command");
        editor.commit(self.id(), |draft| {
            let from = range.start;
            draft.delete(range)?;
            let caret = draft.doc().nearest_text_pos(from);
            draft.set_selection(Selection::collapsed(caret));
            self.run(draft)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandItem {
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub icon: Option<&'static str>,
    pub shortcut: Option<&'static str>,
    pub command: BlockCommand,
}

impl CommandItem {
    pub fn category(&self) -> &'static str {
        if self.category.is_empty() {
            DEFAULT_CATEGORY
        } else {
            self.category
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category().to_lowercase().contains(needle)
    }
}

const fn callout_item(
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    shortcut: &'static str,
    callout_type: CalloutType,
) -> CommandItem {
    CommandItem {
        title,
        description,
        category: "Callouts",
        icon: Some(icon),
        shortcut: Some(shortcut),
        command: BlockCommand::Callout(callout_type),
    }
}

pub static DEFAULT_CATALOG: [CommandItem; 13] = [
    callout_item(
        "Information Callout",
        "Add an information callout box",
        "info",
        "Shift+Command+I",
        CalloutType::Information,
    ),
    callout_item(
        "Best Practice Callout",
        "Add a best practice callout box",
        "check-circle",
        "Shift+Command+B",
        CalloutType::BestPractice,
    ),
    callout_item(
        "Warning Callout",
        "Add a warning callout box",
        "alert-triangle",
        "Shift+Command+U",
        CalloutType::Warning,
    ),
    callout_item(
        "Error Callout",
        "Add an error callout box",
        "alert-circle",
        "Shift+Command+E",
        CalloutType::Error,
    ),
    CommandItem {
        title: "Heading 1",
        description: "Large section heading",
        category: "Basic blocks",
        icon: Some("heading-1"),
        shortcut: Some("# + space"),
        command: BlockCommand::Heading(1),
    },
    CommandItem {
        title: "Heading 2",
        description: "Medium section heading",
        category: "Basic blocks",
        icon: Some("heading-2"),
        shortcut: Some("## + space"),
        command: BlockCommand::Heading(2),
    },
    CommandItem {
        title: "Heading 3",
        description: "Small section heading",
        category: "Basic blocks",
        icon: Some("heading-3"),
        shortcut: Some("### + space"),
        command: BlockCommand::Heading(3),
    },
    CommandItem {
        title: "Bullet List",
        description: "Create a bulleted list",
        category: "Lists",
        icon: Some("list"),
        shortcut: Some("- + space"),
        command: BlockCommand::List(ListKind::Bullet),
    },
    CommandItem {
        title: "Numbered List",
        description: "Create a numbered list",
        category: "Lists",
        icon: Some("list-ordered"),
        shortcut: Some("1. + space"),
        command: BlockCommand::List(ListKind::Ordered),
    },
    CommandItem {
        title: "Task List",
        description: "Create a task checklist",
        category: "Lists",
        icon: Some("check-square"),
        shortcut: None,
        command: BlockCommand::List(ListKind::Task),
    },
    CommandItem {
        title: "Blockquote",
        description: "Create a quote block",
        category: "Basic blocks",
        icon: Some("quote"),
        shortcut: Some("> + space"),
        command: BlockCommand::Blockquote,
    },
    CommandItem {
        title: "Code Block",
        description: "Add a code block",
        category: "Basic blocks",
        icon: Some("code"),
        shortcut: Some("``` + enter"),
        command: BlockCommand::CodeBlock,
    },
    CommandItem {
        title: "Horizontal Rule",
        description: "Add a horizontal divider line",
        category: "Basic blocks",
        icon: Some("minus"),
        shortcut: Some("--- + enter"),
        command: BlockCommand::HorizontalRule,
    },
];

/// Case-insensitive substring match on title, description, or category.
/// A blank query keeps the whole catalog in order.
pub fn filter_commands<'a>(catalog: &'a [CommandItem], query: &str) -> Vec<&'a CommandItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return catalog.iter().collect();
    }
    catalog.iter().filter(|item| item.matches(&needle)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup<'a> {
    pub category: &'static str,
    /// Items with their global index across every group.
    pub items: Vec<(usize, &'a CommandItem)>,
}

/// Groups items by category in first-seen order, keeping declaration order
/// within a category, and numbers them across groups.
pub fn group_commands<'a>(items: &[&'a CommandItem]) -> Vec<CommandGroup<'a>> {
    let mut groups: Vec<CommandGroup<'a>> = Vec::new();
    for &item in items {
        let category = item.category();
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.items.push((0, item)),
            None => groups.push(CommandGroup {
                category,
                items: vec![(0, item)],
            }),
        }
    }

    let mut index = 0;
    for group in &mut groups {
        for entry in &mut group.items {
            entry.0 = index;
            index += 1;
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    Up,
    Down,
    Enter,
    Escape,
}

/// State of an open slash-command menu: the typed trigger range, the query,
/// and the highlighted entry.
#[derive(Debug, Clone)]
pub struct CommandPalette<'a> {
    catalog: &'a [CommandItem],
    range: Range<usize>,
    query: String,
    visible: Vec<&'a CommandItem>,
    selected: usize,
    open: bool,
}

impl<'a> CommandPalette<'a> {
    pub fn open(catalog: &'a [CommandItem], range: Range<usize>) -> Self {
        let mut palette = Self {
            catalog,
            range,
            query: String::new(),
            visible: Vec::new(),
            selected: 0,
            open: true,
        };
        palette.refresh();
        palette
    }

    /// Follows the trigger as the user keeps typing after the slash.
    pub fn update(&mut self, range: Range<usize>, query: &str) {
        self.range = range;
        self.query = query.to_string();
        self.refresh();
    }

    /// Recomputes the visible items. The highlight returns to the first one.
    fn refresh(&mut self) {
        let filtered = filter_commands(self.catalog, &self.query);
        self.visible = group_commands(&filtered)
            .into_iter()
            .flat_map(|group| group.items.into_iter().map(|(_, item)| item))
            .collect();
        self.selected = 0;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Visible items in display order; positions are the global indices.
    pub fn visible(&self) -> &[&'a CommandItem] {
        &self.visible
    }

    pub fn groups(&self) -> Vec<CommandGroup<'a>> {
        group_commands(&self.visible)
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_MESSAGE)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&'a CommandItem> {
        self.visible.get(self.selected).copied()
    }

    pub fn navigate(&mut self, direction: Direction) {
        let len = self.visible.len();
        if len == 0 {
            return;
        }
        self.selected = match direction {
            Direction::Up => (self.selected + len - 1) % len,
            Direction::Down => (self.selected + 1) % len,
        };
    }

    /// Applies the item at `index` over the trigger range and closes the
    /// palette. `None` when there is no such item.
    pub fn select(
        &mut self,
        index: usize,
        editor: &mut Editor,
    ) -> Option<Result<(), EditError>> {
        let item = self.visible.get(index).copied()?;
        tracing::debug!(title = item.title, index, "command selected");
        let result = item.command.apply(editor, self.range.clone());
        self.close();
        Some(result)
    }

    /// Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: PaletteKey, editor: &mut Editor) -> bool {
        if !self.open {
            return false;
        }
        match key {
            PaletteKey::Up => self.navigate(Direction::Up),
            PaletteKey::Down => self.navigate(Direction::Down),
            PaletteKey::Enter => {
                if let Some(Err(err)) = self.select(self.selected, editor) {
                    tracing::warn!("command failed: {err}");
                }
            }
            PaletteKey::Escape => self.close(),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_category_falls_back_to_other() {
        let item = CommandItem {
            category: "",
            ..DEFAULT_CATALOG[0].clone()
        };
        assert_eq!(item.category(), DEFAULT_CATEGORY);
    }

    #[test]
    fn blank_category_is_searchable_as_other() {
        let catalog = [CommandItem {
            category: "",
            ..DEFAULT_CATALOG[0].clone()
        }];
        assert_eq!(filter_commands(&catalog, "other").len(), 1);
        assert_eq!(group_commands(&filter_commands(&catalog, "OTHER"))[0].category, "Other");
    }

    #[test]
    fn grouping_numbers_items_across_groups() {
        let all = filter_commands(&DEFAULT_CATALOG, "");
        let groups = group_commands(&all);
        let categories: Vec<&str> = groups.iter().map(|g| g.category).collect();
        assert_eq!(categories, vec!["Callouts", "Basic blocks", "Lists"]);
        assert_eq!(groups[1].items[0].0, 4);
        assert_eq!(groups[1].items[3].1.title, "Blockquote");
        assert_eq!(groups[2].items[0], (10, &DEFAULT_CATALOG[7]));
    }
}
