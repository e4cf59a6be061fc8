use climatology::{compare_day, ingest, store::parse_date, DayQuery, Layout};
use plotters::prelude::*;

fn naive(date: time::Date) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(date.year(), date.month() as u32, date.day() as u32)
        .expect("time and chrono disagree on a date")
}

fn main() -> miette::Result<()> {
    let mut args = std::env::args().skip(1);
    let input = args.next().expect("Missing filename");
    let date = parse_date(&args.next().expect("Missing date")).expect("Bad date");
    println!("opening {input}");
    let output = format!("{input}.{date}.png");

    let store = ingest::load(&input, &Layout::default())?;
    let report = compare_day(&store, &DayQuery::new(date))?;

    let (Some(high), Some(low)) = (&report.high, &report.low) else {
        miette::bail!("{date} lacks a high or a low reading");
    };
    let (high, low) = (&high.series, &low.series);
    let first = high.first().map_or(date, |entry| entry.date);
    let range = store.temperature_range().unwrap_or(-20.0..40.0);

    let root = BitMapBackend::new(&output, (1920, 1080)).into_drawing_area();
    root.fill(&WHITE).unwrap();
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} across the years", report.target.date),
            ("sans-serif", 60).into_font(),
        )
        .margin(5)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(naive(first)..naive(date), range)
        .unwrap();

    chart.configure_mesh().draw().unwrap();

    chart
        .draw_series(LineSeries::new(
            high.iter().map(|entry| (naive(entry.date), entry.value)),
            RED,
        ))
        .unwrap()
        .label("High")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart
        .draw_series(LineSeries::new(
            low.iter().map(|entry| (naive(entry.date), entry.value)),
            BLUE,
        ))
        .unwrap()
        .label("Low")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    let target = &report.target;
    for (value, color) in [(target.high, RED), (target.low, BLUE)] {
        if let Some(value) = value {
            chart
                .draw_series(std::iter::once(Circle::new(
                    (naive(target.date), value),
                    8,
                    color.filled(),
                )))
                .unwrap();
        }
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
