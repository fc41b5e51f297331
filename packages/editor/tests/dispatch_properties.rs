//! Property tests for dispatch no-op guarantees

use pagecraft_editor::{dispatch, Command, ElementTargetType, ItemType, PasteElementPayload, Store};
use pagecraft_model::{Element, ElementId, Project};
use proptest::prelude::*;

fn store_with_tree() -> (Store, Vec<ElementId>) {
    let mut project = Project::new("Props");
    let page = project.create_page("Home");
    let root = project.page_by_id(&page).unwrap().root.clone();
    let panel = project.create_element(&root, "Panel", true).unwrap();
    let label = project.create_element(&panel, "Label", false).unwrap();
    let button = project.create_element(&root, "Button", false).unwrap();
    project.create_page("About");

    (Store::new(project), vec![root, panel, label, button])
}

fn command(ids: Vec<ElementId>) -> impl Strategy<Value = Command> {
    let known = prop::sample::select(ids);
    prop_oneof![
        Just(Command::Undo),
        Just(Command::Redo),
        Just(Command::Cut),
        Just(Command::Delete),
        Just(Command::Duplicate),
        known.clone().prop_map(Command::DeleteElement),
        known.clone().prop_map(Command::CutElement),
        known.clone().prop_map(Command::DuplicateElement),
        known.prop_map(|id| {
            Command::PasteElement(PasteElementPayload {
                target_id: Some(id),
                target_type: Some(ElementTargetType::Inside),
                element: Element::new("clip-1", "Clip").to_snapshot(),
                project: None,
            })
        }),
    ]
}

fn item_type() -> impl Strategy<Value = ItemType> {
    prop_oneof![Just(ItemType::Element), Just(ItemType::Page)]
}

proptest! {
    #[test]
    fn focused_input_suppresses_every_command(
        commands in prop::collection::vec(command(store_with_tree().1), 1..12),
        item_type in item_type(),
        selected in 0usize..4,
    ) {
        let (mut store, ids) = store_with_tree();
        store.set_focused_item_type(item_type);
        store.set_selected_element(Some(ids[selected].clone()));
        let before = store.project().clone();

        for command in commands {
            let focus = store.focus_snapshot(true);
            dispatch(&mut store, &focus, command);
        }

        prop_assert_eq!(store.project(), &before);
        prop_assert!(!store.history().can_undo());
    }

    #[test]
    fn removing_unknown_ids_changes_nothing(suffix in "[a-z]{1,8}", cut in any::<bool>()) {
        let (mut store, _) = store_with_tree();
        let before = store.project().clone();
        let id = ElementId::new(format!("unknown-{}", suffix));
        let command = if cut { Command::CutElement(id) } else { Command::DeleteElement(id) };

        let focus = store.focus_snapshot(false);
        let outcome = dispatch(&mut store, &focus, command);

        prop_assert!(!outcome.is_applied());
        prop_assert_eq!(store.project(), &before);
    }

    #[test]
    fn every_command_leaves_no_batch_open(
        commands in prop::collection::vec(command(store_with_tree().1), 1..16),
        item_type in item_type(),
    ) {
        let (mut store, _) = store_with_tree();
        store.set_focused_item_type(item_type);

        for command in commands {
            let focus = store.focus_snapshot(false);
            dispatch(&mut store, &focus, command);
            prop_assert!(!store.history().is_batch_open());
            prop_assert!(!store.history().has_pending());
        }
    }
}
