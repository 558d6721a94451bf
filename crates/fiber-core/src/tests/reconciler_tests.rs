use super::*;
use crate::element::Props;

fn p(text: &str) -> Element {
    Element::host("p").child(text).build()
}

fn span() -> Element {
    Element::host("span").build()
}

struct Fixture {
    fibers: FiberTree<u32>,
    deletions: Vec<FiberId>,
    committed: FiberId,
}

impl Fixture {
    /// A committed parent whose children were rendered from `elements`, each
    /// owning host node `100 + position`.
    fn committed(elements: &[Element]) -> Self {
        let mut fibers = FiberTree::new();
        let mut deletions = Vec::new();
        let committed = fibers.insert(Fiber::root(0, Props::new(), None));
        reconcile_children(&mut fibers, &mut deletions, committed, elements).unwrap();
        for (position, child) in fibers.children(committed).into_iter().enumerate() {
            fibers.get_mut(child).unwrap().host_node = Some(100 + position as u32);
        }
        Self {
            fibers,
            deletions,
            committed,
        }
    }

    fn rerender(&mut self, elements: &[Element]) -> FiberId {
        let wip = self
            .fibers
            .insert(Fiber::root(0, Props::new(), Some(self.committed)));
        self.deletions.clear();
        reconcile_children(&mut self.fibers, &mut self.deletions, wip, elements).unwrap();
        wip
    }

    fn effects(&self, parent: FiberId) -> Vec<Option<EffectTag>> {
        self.fibers
            .children(parent)
            .into_iter()
            .map(|id| self.fibers.get(id).unwrap().effect)
            .collect()
    }

    fn old_children(&self) -> Vec<FiberId> {
        self.fibers.children(self.committed)
    }
}

#[test]
fn first_render_places_every_child() {
    let fixture = Fixture::committed(&[p("a"), span()]);
    assert_eq!(
        fixture.effects(fixture.committed),
        vec![Some(EffectTag::Placement), Some(EffectTag::Placement)]
    );
    assert!(fixture.deletions.is_empty());
}

#[test]
fn shorter_list_updates_by_position_and_deletes_the_tail() {
    let mut fixture = Fixture::committed(&[p("A"), p("B"), p("C")]);
    let old = fixture.old_children();
    let wip = fixture.rerender(&[p("A'"), p("B")]);

    assert_eq!(
        fixture.effects(wip),
        vec![Some(EffectTag::Update), Some(EffectTag::Update)]
    );
    assert_eq!(fixture.deletions, vec![old[2]]);
    assert_eq!(
        fixture.fibers.get(old[2]).unwrap().effect,
        Some(EffectTag::Deletion)
    );

    let new = fixture.fibers.children(wip);
    for (position, id) in new.iter().enumerate() {
        let fiber = fixture.fibers.get(*id).unwrap();
        assert_eq!(fiber.alternate, Some(old[position]));
        assert_eq!(fiber.host_node, Some(100 + position as u32));
        assert_eq!(fiber.parent, Some(wip));
    }
}

#[test]
fn kind_change_replaces_instead_of_updating() {
    let mut fixture = Fixture::committed(&[p("x")]);
    let old = fixture.old_children();
    let wip = fixture.rerender(&[span()]);

    assert_eq!(fixture.effects(wip), vec![Some(EffectTag::Placement)]);
    assert_eq!(fixture.deletions, old);
    let placed = fixture.fibers.children(wip)[0];
    let placed = fixture.fibers.get(placed).unwrap();
    assert_eq!(placed.host_node, None);
    assert_eq!(placed.alternate, None);
}

#[test]
fn swapping_kinds_never_moves() {
    let mut fixture = Fixture::committed(&[p("x"), span()]);
    let old = fixture.old_children();
    let wip = fixture.rerender(&[span(), p("x")]);

    assert_eq!(
        fixture.effects(wip),
        vec![Some(EffectTag::Placement), Some(EffectTag::Placement)]
    );
    assert_eq!(fixture.deletions, old);
}

#[test]
fn longer_list_appends_placements() {
    let mut fixture = Fixture::committed(&[p("a")]);
    let wip = fixture.rerender(&[p("a"), p("b"), span()]);
    assert_eq!(
        fixture.effects(wip),
        vec![
            Some(EffectTag::Update),
            Some(EffectTag::Placement),
            Some(EffectTag::Placement)
        ]
    );
    assert!(fixture.deletions.is_empty());
}

#[test]
fn empty_list_deletes_everything() {
    let mut fixture = Fixture::committed(&[p("a"), p("b")]);
    let old = fixture.old_children();
    let wip = fixture.rerender(&[]);
    assert_eq!(fixture.fibers.get(wip).unwrap().child, None);
    assert_eq!(fixture.deletions, old);
}

#[test]
fn empty_host_kind_fails_before_touching_the_tree() {
    let mut fixture = Fixture::committed(&[p("a")]);
    let before = fixture.fibers.len();
    let wip = fixture
        .fibers
        .insert(Fiber::root(0, Props::new(), Some(fixture.committed)));
    let err = reconcile_children(
        &mut fixture.fibers,
        &mut fixture.deletions,
        wip,
        &[p("ok"), Element::host("").build()],
    )
    .unwrap_err();

    assert_eq!(
        err,
        RenderError::MalformedElement {
            position: 1,
            reason: "host element has an empty kind",
        }
    );
    assert_eq!(fixture.fibers.len(), before + 1);
    assert!(fixture.deletions.is_empty());
}
