//! Integration tests for the live-mutation engine driving a shared grid.

use std::time::Duration;

use tablekit_lib::live::LiveMutationConfig;
use tablekit_lib::live::LiveMutationEngine;
use tablekit_lib::live::MutationMode;
use tablekit_lib::model::ColumnDef;
use tablekit_lib::model::Row;
use tablekit_lib::model::Value;
use tablekit_lib::state::SortModel;
use tablekit_lib::state::StatePatch;
use tablekit_lib::{Grid, GridConfig};

fn rows(n: i64) -> Vec<Row> {
    (0..n)
        .map(|i| Row::new().set("id", i).set("price", 1000).set("name", format!("item {}", i)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_sequential_ticks_account_rows() {
    let mut grid = Grid::new(GridConfig::default());
    grid.set_columns(vec![ColumnDef::field("id"), ColumnDef::field("price")])
        .unwrap();
    grid.set_rows(rows(100)).unwrap();
    let grid = grid.into_shared();
    let mut commits = grid.lock().await.subscribe();
    commits.borrow_and_update();

    let config = LiveMutationConfig::default()
        .with_interval(Duration::from_millis(100))
        .with_rows_per_tick(10)
        .with_mode(MutationMode::Sequential)
        .with_update_fields(["price", "name"])
        .with_seed(42);
    let mut engine = LiveMutationEngine::new(grid.clone(), config);
    engine.start();
    tokio::time::sleep(Duration::from_millis(350)).await;
    engine.stop().await;

    let metrics = engine.metrics();
    assert_eq!(metrics.total_ticks, 3);
    assert_eq!(metrics.total_rows_mutated, 30);
    assert!(commits.has_changed().unwrap());

    let grid = grid.lock().await;
    for (i, row) in grid.state().rows.iter().enumerate() {
        let Value::Int(price) = row.value("price") else {
            panic!("price should stay an integer");
        };
        if i < 30 {
            assert!((950..=1050).contains(price), "row {} price {}", i, price);
        } else {
            assert_eq!(*price, 1000);
        }
        assert_eq!(row.value("name"), &Value::from(format!("item {}", i)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_view_tracks_mutations() {
    let mut grid = Grid::new(GridConfig::default().with_page_size(5));
    grid.set_columns(vec![ColumnDef::field("id"), ColumnDef::field("price")])
        .unwrap();
    grid.set_rows(rows(20)).unwrap();
    grid.commit(StatePatch::SetSortModel(SortModel::desc("price")))
        .unwrap();
    let grid = grid.into_shared();

    let mut engine = LiveMutationEngine::new(
        grid.clone(),
        LiveMutationConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_rows_per_tick(20)
            .with_mode(MutationMode::Batch)
            .with_update_fields(["price"])
            .with_seed(1),
    );
    engine.start();
    tokio::time::sleep(Duration::from_millis(55)).await;
    engine.stop().await;

    let grid = grid.lock().await;
    let view = grid.view();
    assert_eq!(view.window_rows.len(), 5);
    let prices: Vec<i64> = view
        .window_rows
        .iter()
        .filter_map(|r| match r.value("price") {
            Value::Int(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(prices.windows(2).all(|w| w[0] >= w[1]), "{:?}", prices);
}

#[tokio::test(start_paused = true)]
async fn test_sequential_windows_advance_per_tick() {
    let mut grid = Grid::new(GridConfig::default());
    grid.set_columns(vec![ColumnDef::field("id"), ColumnDef::field("price")])
        .unwrap();
    grid.set_rows(
        (0..100i64)
            .map(|i| Row::new().set("id", i).set("price", 500.0))
            .collect(),
    )
    .unwrap();
    let grid = grid.into_shared();

    let mut engine = LiveMutationEngine::new(
        grid.clone(),
        LiveMutationConfig::default()
            .with_interval(Duration::from_millis(100))
            .with_rows_per_tick(10)
            .with_mode(MutationMode::Sequential)
            .with_update_fields(["price"])
            .with_seed(3),
    );
    engine.start();

    let mut previous: Vec<Value> = vec![Value::Float(500.0); 100];
    for tick in 0..3usize {
        let wait = if tick == 0 { 105 } else { 100 };
        tokio::time::sleep(Duration::from_millis(wait)).await;

        let current: Vec<Value> = grid
            .lock()
            .await
            .state()
            .rows
            .iter()
            .map(|r| r.value("price").clone())
            .collect();
        let changed: Vec<usize> = (0..100).filter(|&i| current[i] != previous[i]).collect();
        assert_eq!(changed, (tick * 10..tick * 10 + 10).collect::<Vec<_>>(), "tick {}", tick);
        previous = current;
    }
    engine.stop().await;

    let metrics = engine.metrics();
    assert_eq!(metrics.total_ticks, 3);
    assert_eq!(metrics.total_rows_mutated, 30);
}
