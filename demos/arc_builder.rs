//! Build an arc from two reshape handles and print the persisted item.
//!
//!   RUST_LOG=shapegraph=debug cargo run --example arc_builder --features tracing -- 0.1 0.6

use shapegraph::coord::{ReshapeCoordinate, ReshapeType};
use shapegraph::persist::ElementWriter;
use shapegraph::shape::{RectangleShape, rebuild};
use shapegraph::{Coordinate, GraphItem, Shape, ShapeBuilder};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1).map(|a| a.parse::<f64>());
    let start = args.next().and_then(Result::ok).unwrap_or(0.0);
    let end = args.next().and_then(Result::ok).unwrap_or(0.75);

    let mut item = GraphItem::new(RectangleShape::new());
    for (name, fraction) in [("start", start), ("end", end)] {
        item.add_reshape_coordinate(
            ReshapeCoordinate::new(name, Coordinate::from_xy(fraction, 0.0), ReshapeType::Angle, ReshapeType::Fixed)
                .with_x_range(0.0, 1.0)
                .with_builder(ShapeBuilder::Arc),
        );
    }

    if !rebuild(&mut item) {
        eprintln!("Error: no builder attached");
        return;
    }
    println!("{} outline points", item.shape().point_list().len());

    let mut writer = ElementWriter::new();
    item.save(&mut writer);
    for element in writer.finish() {
        println!("{}", element.to_xml());
    }
}
