use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use trellis_kernel::{Move, Navigator, RejectionKind};
use trellis_store::FallbackChain;
use std::collections::HashSet;
use trellis_test_utils::{
    text, AppendInputOnShow, HookLog, RecordingPageHooks, RecordingSectionHooks,
};
use trellis_tree::{
    ExperimentTemplate, HookError, Page, Section, SectionHooks, SectionMut, SessionContext,
    TemplateBuilder,
};

/// ```text
/// exp
/// ├── s1   p1, p2
/// ├── s2
/// │   └── s3   p3
/// └── p4
/// ```
fn nested_template(sections: &HookLog, pages: &HookLog) -> ExperimentTemplate {
    let root = Section::new("exp").with_hooks(RecordingSectionHooks::new("exp", sections));
    let mut builder = TemplateBuilder::new(root).unwrap();
    builder
        .section(
            "exp",
            Section::new("s1").with_hooks(RecordingSectionHooks::new("s1", sections)),
        )
        .unwrap()
        .page("exp.s1", Page::new("p1").with_hooks(RecordingPageHooks::new(pages)))
        .unwrap()
        .page("exp.s1", Page::new("p2").with_hooks(RecordingPageHooks::new(pages)))
        .unwrap()
        .section(
            "exp",
            Section::new("s2").with_hooks(RecordingSectionHooks::new("s2", sections)),
        )
        .unwrap()
        .section(
            "exp.s2",
            Section::new("s3").with_hooks(RecordingSectionHooks::new("s3", sections)),
        )
        .unwrap()
        .page("exp.s2.s3", Page::new("p3"))
        .unwrap()
        .page("exp", Page::new("p4"))
        .unwrap();
    builder.build()
}

fn navigator(template: &ExperimentTemplate) -> Navigator {
    let tree = template.instantiate(&mut StdRng::seed_from_u64(11));
    Navigator::new("lifecycle", tree, FallbackChain::empty())
}

async fn forward(nav: &mut Navigator) {
    let outcome = nav.request_move(Move::Forward).await.unwrap();
    assert!(!outcome.is_rejected(), "forward rejected: {outcome:?}");
}

#[tokio::test]
async fn section_hooks_follow_the_path_between_pages() {
    let sections = HookLog::new();
    let pages = HookLog::new();
    let mut nav = navigator(&nested_template(&sections, &pages));

    nav.start().await.unwrap();
    assert_eq!(sections.entries(), vec!["enter:exp", "enter:s1"]);
    sections.clear();

    // inside one section nothing is entered or left
    forward(&mut nav).await;
    assert!(sections.entries().is_empty());

    forward(&mut nav).await;
    assert_eq!(
        sections.entries(),
        vec!["leave:s1", "resume:exp", "hand_over:exp", "enter:s2", "enter:s3"]
    );
    sections.clear();

    forward(&mut nav).await;
    assert_eq!(sections.entries(), vec!["leave:s3", "leave:s2", "resume:exp"]);
    sections.clear();

    forward(&mut nav).await;
    assert_eq!(sections.entries(), vec!["leave:exp"]);
    assert!(nav.status().is_terminal());
}

#[tokio::test]
async fn backward_moves_run_the_same_section_events() {
    let sections = HookLog::new();
    let pages = HookLog::new();
    let mut nav = navigator(&nested_template(&sections, &pages));
    nav.start().await.unwrap();
    forward(&mut nav).await;
    forward(&mut nav).await;
    sections.clear();

    let outcome = nav.request_move(Move::Backward).await.unwrap();
    assert!(outcome.is_committed());
    assert_eq!(
        sections.entries(),
        vec!["leave:s3", "leave:s2", "resume:exp", "hand_over:exp", "enter:s1"]
    );
}

#[tokio::test]
async fn page_hooks_distinguish_first_and_repeated_visits() {
    let sections = HookLog::new();
    let pages = HookLog::new();
    let mut nav = navigator(&nested_template(&sections, &pages));

    nav.start().await.unwrap();
    forward(&mut nav).await;
    assert!(nav.request_move(Move::Backward).await.unwrap().is_committed());
    forward(&mut nav).await;

    assert_eq!(
        pages.entries(),
        vec![
            "first_show:p1",
            "show:p1",
            "first_hide:p1",
            "hide:p1",
            "first_show:p2",
            "show:p2",
            "first_hide:p2",
            "hide:p2",
            "show:p1",
            "hide:p1",
            "show:p2",
        ]
    );
}

#[tokio::test]
async fn rejected_moves_fire_no_lifecycle_hooks() {
    let sections = HookLog::new();
    let pages = HookLog::new();
    let mut nav = navigator(&nested_template(&sections, &pages));
    nav.start().await.unwrap();
    sections.clear();
    pages.clear();

    let outcome = nav.request_move(Move::Backward).await.unwrap();
    assert_eq!(outcome.rejection_kind(), Some(RejectionKind::NoPreviousPage));
    assert!(sections.entries().is_empty());
    assert!(pages.entries().is_empty());
}

#[tokio::test]
async fn element_added_on_first_show_is_validated_and_collected() {
    let hooks = std::sync::Arc::new(AppendInputOnShow {
        element: "extra".to_string(),
    });
    let mut builder = TemplateBuilder::new(Section::new("exp")).unwrap();
    builder
        .page("exp", Page::new("q").with_hooks(hooks))
        .unwrap()
        .page("exp", Page::new("done"))
        .unwrap();
    let template = builder.build();
    let mut nav = navigator(&template);
    nav.start().await.unwrap();

    let q = nav.current_page().unwrap();
    assert!(nav.tree().page(q).unwrap().element("extra").is_some());
    // the template itself is untouched
    let template_q = template.tree().resolve(&"exp.q".parse().unwrap()).unwrap();
    assert!(template.tree().page(template_q).unwrap().element("extra").is_none());

    let outcome = nav.request_move(Move::Forward).await.unwrap();
    assert_eq!(outcome.rejection_kind(), Some(RejectionKind::ValidationFailed));

    nav.submit("extra", text("filled in")).unwrap();
    forward(&mut nav).await;
    assert_eq!(nav.record().values.get("extra"), Some(&text("filled in")));
}

/// Appends one page to its section the first time the section is entered
#[derive(Debug)]
struct AppendPageOnEnter;

impl SectionHooks for AppendPageOnEnter {
    fn on_enter(
        &self,
        section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        if section.section()?.member("late").is_none() {
            section.append_page(Page::new("late"))?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn pages_appended_on_enter_join_the_traversal() {
    let mut builder = TemplateBuilder::new(Section::new("exp")).unwrap();
    builder
        .page("exp", Page::new("first"))
        .unwrap()
        .section(
            "exp",
            Section::new("grow").with_hooks(std::sync::Arc::new(AppendPageOnEnter)),
        )
        .unwrap()
        .page("exp.grow", Page::new("early"))
        .unwrap()
        .page("exp", Page::new("last"))
        .unwrap();
    let mut nav = navigator(&builder.build());
    nav.start().await.unwrap();

    let mut visited = vec![nav.current_position().unwrap().to_string()];
    while !nav.status().is_terminal() {
        forward(&mut nav).await;
        if let Some(position) = nav.current_position() {
            visited.push(position.to_string());
        }
    }
    assert_eq!(
        visited,
        vec!["exp.first", "exp.grow.early", "exp.grow.late", "exp.last"]
    );
}

async fn walk_to_the_end(nav: &mut Navigator) -> Vec<String> {
    let mut visited = vec![nav.current_position().unwrap().to_string()];
    while !nav.status().is_terminal() {
        forward(nav).await;
        if let Some(position) = nav.current_position() {
            visited.push(position.to_string());
        }
    }
    visited
}

#[tokio::test]
async fn section_empty_in_the_template_is_filled_on_entry() {
    let mut builder = TemplateBuilder::new(Section::new("exp")).unwrap();
    builder
        .page("exp", Page::new("first"))
        .unwrap()
        .section(
            "exp",
            Section::new("grow").with_hooks(std::sync::Arc::new(AppendPageOnEnter)),
        )
        .unwrap()
        .page("exp", Page::new("last"))
        .unwrap();
    let mut nav = navigator(&builder.build());
    nav.start().await.unwrap();

    assert_eq!(
        walk_to_the_end(&mut nav).await,
        vec!["exp.first", "exp.grow.late", "exp.last"]
    );
}

#[tokio::test]
async fn section_left_empty_after_entry_is_passed_through() {
    let sections = HookLog::new();
    let mut builder = TemplateBuilder::new(Section::new("exp")).unwrap();
    builder
        .page("exp", Page::new("p1"))
        .unwrap()
        .section(
            "exp",
            Section::new("hollow").with_hooks(RecordingSectionHooks::new("hollow", &sections)),
        )
        .unwrap()
        .page("exp", Page::new("p2"))
        .unwrap()
        .section(
            "exp",
            Section::new("tail").with_hooks(RecordingSectionHooks::new("tail", &sections)),
        )
        .unwrap();
    let mut nav = navigator(&builder.build());
    nav.start().await.unwrap();

    forward(&mut nav).await;
    assert_eq!(nav.current_position().unwrap().to_string(), "exp.p2");
    assert_eq!(sections.entries(), vec!["enter:hollow", "leave:hollow"]);
    sections.clear();

    let outcome = nav.request_move(Move::Forward).await.unwrap();
    assert!(outcome.is_finished());
    assert_eq!(sections.entries(), vec!["enter:tail", "leave:tail"]);
}

/// Adds a shuffled block of six pages the first time the section is entered
#[derive(Debug)]
struct AppendShuffledBlock;

impl SectionHooks for AppendShuffledBlock {
    fn on_enter(
        &self,
        section: &mut SectionMut<'_>,
        _session: &SessionContext,
    ) -> Result<(), HookError> {
        if section.section()?.member("block").is_some() {
            return Ok(());
        }
        let block = section.append_section(Section::new("block").shuffle(true))?;
        let mut block = section.subsection(block)?;
        for i in 0..6 {
            block.append_page(Page::new(format!("x{i}")))?;
        }
        Ok(())
    }
}

/// Block pages in the order one session displays them
async fn block_order(seed: u64) -> Vec<String> {
    let mut builder = TemplateBuilder::new(Section::new("exp")).unwrap();
    builder
        .page("exp", Page::new("intro"))
        .unwrap()
        .section(
            "exp",
            Section::new("host").with_hooks(std::sync::Arc::new(AppendShuffledBlock)),
        )
        .unwrap()
        .page("exp.host", Page::new("start"))
        .unwrap();
    let mut nav = navigator(&builder.build()).with_rng(StdRng::seed_from_u64(seed));
    nav.start().await.unwrap();

    let visited = walk_to_the_end(&mut nav).await;
    let block = nav.tree().resolve(&"exp.host.block".parse().unwrap()).unwrap();
    let section = nav.tree().section(block).unwrap();
    assert!(section.is_order_fixed());

    let displayed: Vec<String> = visited
        .into_iter()
        .filter_map(|p| p.strip_prefix("exp.host.block.").map(str::to_string))
        .collect();
    let fixed: Vec<String> = section
        .traversal_order()
        .iter()
        .map(|id| nav.tree()[*id].name().to_string())
        .collect();
    assert_eq!(displayed, fixed);
    displayed
}

#[tokio::test]
async fn sections_appended_at_runtime_are_shuffled_on_entry() {
    let mut orders = HashSet::new();
    for seed in 0..20 {
        let order = block_order(seed).await;
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["x0", "x1", "x2", "x3", "x4", "x5"]);
        orders.insert(order);
    }
    assert!(orders.len() > 1);
    assert_eq!(block_order(4).await, block_order(4).await);
}
