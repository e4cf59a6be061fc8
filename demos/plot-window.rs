use climatology::{ingest, store::parse_date, Layout, WindowQuery};
use plotters::prelude::*;

fn naive(date: time::Date) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(date.year(), date.month() as u32, date.day() as u32)
        .expect("time and chrono disagree on a date")
}

fn main() -> miette::Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args.next().expect("Missing filename");
    let end = parse_date(&args.next().expect("Missing end date")).expect("Bad date");
    let days = args.next().map_or(14, |days| days.parse().expect("Bad number of days"));
    println!("opening {input}");
    let output = format!("{input}.window.png");

    let store = ingest::load(&input, &Layout::default())?;
    let comparison = WindowQuery::new(end, days).run(&store)?;

    let points = &comparison.overlay;
    let values = points.iter().flat_map(|point| {
        [
            point.high.map(f64::from),
            point.low.map(f64::from),
            point.historical_high,
            point.historical_low,
        ]
        .into_iter()
        .flatten()
    });
    let (min, max) = values.fold((f64::MAX, f64::MIN), |(min, max), v| (min.min(v), max.max(v)));
    let (min, max) = if min <= max { (min - 1., max + 1.) } else { (-20., 40.) };

    let root = BitMapBackend::new(&output, (1920, 1080)).into_drawing_area();
    root.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Last {} days: actual vs historical average (top {:.1}%)",
                comparison.window_length,
                comparison.top_percent()
            ),
            ("sans-serif", 50).into_font(),
        )
        .margin(5)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(naive(comparison.start_date())..naive(end), min..max)
        .unwrap();

    chart.configure_mesh().draw().unwrap();

    let series = [
        ("High", RED, points.iter().map(|p| (p.date, p.high.map(f64::from))).collect::<Vec<_>>()),
        ("Historical high", MAGENTA, points.iter().map(|p| (p.date, p.historical_high)).collect()),
        ("Low", BLUE, points.iter().map(|p| (p.date, p.low.map(f64::from))).collect()),
        ("Historical low", CYAN, points.iter().map(|p| (p.date, p.historical_low)).collect()),
    ];
    for (label, color, line) in series {
        chart
            .draw_series(LineSeries::new(
                line.into_iter()
                    .filter_map(|(date, value)| Some((naive(date), value?))),
                color,
            ))
            .unwrap()
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

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
