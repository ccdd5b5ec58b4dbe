use console::Style;
use zfold_core::io::ser::StackLayout;
use zfold_core::pipeline::config::{FrapConfig, ProjectConfig};
use zfold_core::pipeline::{BatchReport, ImageStatus};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    ok: Style,
    failed: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            ok: Style::new().green(),
            failed: Style::new().red().bold(),
        }
    }
}

fn print_title(s: &Styles, title: &str) {
    println!();
    println!("  {}", s.title.apply_to(title));
    println!(
        "  {}",
        s.title.apply_to("\u{2550}".repeat(title.chars().count()))
    );
    println!();
}

fn print_inputs(s: &Styles, inputs: &[std::path::PathBuf]) {
    if let [single] = inputs {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Input"),
            s.path.apply_to(single.display())
        );
    } else {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Inputs"),
            s.value.apply_to(format!("{} files", inputs.len()))
        );
    }
}

fn print_layout(s: &Styles, layout: Option<&StackLayout>) {
    match layout {
        Some(l) => println!(
            "  {:<14}{}",
            s.label.apply_to("Layout"),
            s.value.apply_to(format!("Z={} C={} T={}", l.size_z, l.size_c, l.size_t))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Layout"),
            s.disabled.apply_to("all frames are Z planes")
        ),
    }
}

pub fn print_projection_summary(config: &ProjectConfig) {
    let s = Styles::new();
    print_title(&s, "Z Projection");

    print_inputs(&s, &config.inputs);
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    print_layout(&s, config.layout.as_ref());
    println!();

    let p = &config.projection;
    println!("  {}", s.header.apply_to("Projection"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(p.method)
    );
    let first = p.first_z.map_or_else(|| "first".to_string(), |z| z.to_string());
    let last = p.last_z.map_or_else(|| "last".to_string(), |z| z.to_string());
    println!(
        "    {:<12}{}",
        s.label.apply_to("Z range"),
        s.value.apply_to(format!("{first}..{last}"))
    );
    match (p.roi_only, &p.rois) {
        (true, Some(rois)) => println!(
            "    {:<12}{}",
            s.label.apply_to("ROIs"),
            s.path.apply_to(rois.display())
        ),
        _ => println!(
            "    {:<12}{}",
            s.label.apply_to("ROIs"),
            s.disabled.apply_to("full frame")
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Format"),
        s.value.apply_to(config.output.format)
    );
    println!();
}

pub fn print_frap_summary(config: &FrapConfig) {
    let s = Styles::new();
    print_title(&s, "FRAP Analysis");

    print_inputs(&s, &config.inputs);
    println!(
        "  {:<14}{}",
        s.label.apply_to("ROIs"),
        s.path.apply_to(config.rois.display())
    );
    print_layout(&s, config.layout.as_ref());
    println!(
        "  {:<14}{}",
        s.label.apply_to("Channel"),
        s.value.apply_to(config.channel)
    );
    match config.frame_interval_secs {
        Some(dt) => println!(
            "  {:<14}{}",
            s.label.apply_to("Interval"),
            s.value.apply_to(format!("{dt} s"))
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Interval"),
            s.disabled.apply_to("from timestamps")
        ),
    }
    match config.report_dir {
        Some(ref dir) => println!(
            "  {:<14}{}",
            s.label.apply_to("Reports"),
            s.path.apply_to(dir.display())
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Reports"),
            s.disabled.apply_to("disabled")
        ),
    }
    println!();
}

pub fn print_batch_report(report: &BatchReport) {
    let s = Styles::new();
    println!();
    println!("  {}", s.header.apply_to("Results"));

    for image in &report.images {
        match &image.status {
            ImageStatus::Projected { planes, outputs } => println!(
                "    {:<20}{} {}",
                s.value.apply_to(&image.image),
                s.ok.apply_to(format!("{planes} planes")),
                s.label.apply_to(format!("-> {} file(s)", outputs.len()))
            ),
            ImageStatus::Analyzed(result) => println!(
                "    {:<20}{} {}",
                s.value.apply_to(&image.image),
                s.ok.apply_to(format!("tHalf {:.2} s", result.half_time)),
                s.label
                    .apply_to(format!("mobile fraction {:.2}", result.mobile_fraction))
            ),
            ImageStatus::Skipped(reason) => println!(
                "    {:<20}{}",
                s.value.apply_to(&image.image),
                s.disabled.apply_to(format!("skipped: {reason}"))
            ),
            ImageStatus::Failed(e) => println!(
                "    {:<20}{}",
                s.value.apply_to(&image.image),
                s.failed.apply_to(format!("failed: {e}"))
            ),
        }
    }

    let summary = report.summary();
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Succeeded"),
        s.ok.apply_to(summary.succeeded)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Skipped"),
        s.disabled.apply_to(summary.skipped)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Failed"),
        s.failed.apply_to(summary.failed)
    );
    println!();
}
