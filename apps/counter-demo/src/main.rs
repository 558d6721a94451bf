use fiber_core::{
    component, create_element, Element, Hooks, MemoryHost, NodeId, Props, RenderError, Root,
    RootOptions,
};
use fiber_runtime_std::StdRuntime;

const CLICKS: usize = 3;

fn counter(hooks: &mut Hooks<'_>, props: &Props) -> Element {
    let step = props.get_int("step").unwrap_or(1);
    let (count, set_count) = hooks.use_state(0_i64);
    Element::host("section")
        .child(Element::host("h1").child(format!("Count: {count}")))
        .child(
            Element::host("button")
                .attr("type", "button")
                .on("click", move || set_count.update(move |count| count + step))
                .child(format!("+{step}")),
        )
        .build()
}

fn bootstrap() -> Element {
    create_element(
        "div",
        [("id", "foo")],
        [
            create_element("a", Vec::<(&str, &str)>::new(), ["Hello World!"]),
            create_element("b", Vec::<(&str, &str)>::new(), Vec::<Element>::new()),
        ],
    )
}

fn main() {
    env_logger::init();

    println!("=== Fiber-RS Counter Example ===");
    println!("Renders a static tree, then a stateful counter clicked {CLICKS} times.");
    println!();

    if let Err(err) = run() {
        log::error!("demo aborted: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), RenderError> {
    let runtime = StdRuntime::new();
    let mut host = MemoryHost::new();
    host.record_mutations(false);
    let container = host.create_container("root");
    let mut root = runtime.create_root(host, container, RootOptions::default());

    root.render(bootstrap());
    settle(&runtime, &mut root, "bootstrap")?;

    root.render(
        Element::component(component!(counter))
            .attr("step", 2)
            .build(),
    );
    settle(&runtime, &mut root, "mount counter")?;

    for click in 1..=CLICKS {
        let Some(button) = first_button(&root) else {
            log::error!("counter rendered no button");
            break;
        };
        if !root.host().dispatch(button, "click") {
            log::warn!("button #{button} has no click listener");
        }
        settle(&runtime, &mut root, &format!("click {click}"))?;
    }
    Ok(())
}

fn settle(
    runtime: &StdRuntime,
    root: &mut Root<MemoryHost>,
    label: &str,
) -> Result<(), RenderError> {
    let slices = runtime.run_until_idle(root)?;
    let container = *root.container();
    println!("--- {label} ({slices} idle slices) ---");
    print!("{}", root.host().dump_tree(container));
    if let Some(stats) = root.last_commit() {
        log::info!("{label}: {stats:?}");
    }
    root.host_mut().collect_detached();
    println!();
    Ok(())
}

fn first_button(root: &Root<MemoryHost>) -> Option<NodeId> {
    root.host()
        .find_all(*root.container(), "button")
        .into_iter()
        .next()
}
