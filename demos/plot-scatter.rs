use climatology::{compare_day, ingest, store::parse_date, DayQuery, Layout};
use plotters::prelude::*;

fn main() -> miette::Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args.next().expect("Missing filename");
    let date = parse_date(&args.next().expect("Missing date")).expect("Bad date");
    println!("opening {input}");
    let output = format!("{input}.{date}.scatter.png");

    let store = ingest::load(&input, &Layout::default())?;
    let report = compare_day(&store, &DayQuery::new(date))?;
    let range = store.temperature_range().unwrap_or(-20.0..40.0);

    let root = BitMapBackend::new(&output, (1080, 1080)).into_drawing_area();
    root.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("High against low on {}", report.target.month_day()),
            ("sans-serif", 60).into_font(),
        )
        .margin(5)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(range.clone(), range)
        .unwrap();

    chart
        .configure_mesh()
        .x_desc("low (℃)")
        .y_desc("high (℃)")
        .draw()
        .unwrap();

    let (target, others): (Vec<_>, Vec<_>) = report.scatter.iter().partition(|point| point.is_target);
    chart
        .draw_series(
            others
                .iter()
                .map(|point| Circle::new((point.low, point.high), 5, BLUE.mix(0.6).filled())),
        )
        .unwrap()
        .label("Other years")
        .legend(|(x, y)| Circle::new((x, y), 5, BLUE.filled()));
    chart
        .draw_series(
            target
                .iter()
                .map(|point| Circle::new((point.low, point.high), 10, RED.filled())),
        )
        .unwrap()
        .label(date.to_string())
        .legend(|(x, y)| Circle::new((x, y), 5, RED.filled()));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .unwrap();

    root.present().unwrap();
    println!("wrote {output}");
    Ok(())
}
