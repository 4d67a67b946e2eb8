//! End-to-end properties of the zonal maximum overlay.

use test_utils::{create_intensity_grid, create_noise_grid, create_test_grid, rings};
use zonal_stats::{
    compute_zonal_max, parse_result_pairs, to_csv, CrsCode, CrsNormalizer, FieldNames,
    GridGeometry, Polygon, PolygonRegion, RasterGrid, RegionId, RegionSet, Ring, ZonalConfig,
    ZonalError, ZonalOverlay,
};

const ND: f32 = -9999.0;

/// 10 x 10 grid of 1-degree cells over (-10, 30)-(0, 40).
fn noise_grid() -> RasterGrid {
    RasterGrid::new(
        GridGeometry::north_up(-10.0, 40.0, 1.0, 10, 10),
        create_noise_grid(10, 10, 10.0, 7),
        Some(ND),
        Some(CrsCode::WGS84),
    )
    .unwrap()
}

fn square(id: impl Into<RegionId>, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> PolygonRegion {
    PolygonRegion::new(
        id,
        vec![Ring::new(rings::square(min_x, min_y, max_x, max_y))],
        Some(CrsCode::WGS84),
    )
}

fn mixed_regions() -> RegionSet {
    RegionSet::new(vec![
        square(40i64, -9.5, 31.2, -6.1, 35.7),
        square("outside", 20.0, 20.0, 25.0, 25.0),
        PolygonRegion::new(
            7i64,
            vec![Ring::new(rings::circle(-4.0, 36.0, 2.5, 24))],
            Some(CrsCode::WGS84),
        ),
        PolygonRegion::new(
            "donut",
            vec![
                Ring::new(rings::square(-10.0, 30.0, -5.0, 35.0)),
                Ring::new(rings::square(-9.0, 31.0, -6.0, 34.0)),
            ],
            Some(CrsCode::WGS84),
        ),
        square(3i64, -1.0, 39.0, 5.0, 45.0),
    ])
    .unwrap()
}

#[test]
fn output_matches_region_count_and_order() {
    let grid = noise_grid();
    let mut regions = mixed_regions();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();

    assert_eq!(table.len(), regions.len());
    let table_ids: Vec<&RegionId> = table.iter().map(|r| &r.id).collect();
    let region_ids: Vec<&RegionId> = regions.iter().map(|r| &r.id).collect();
    assert_eq!(table_ids, region_ids);
}

#[test]
fn parallel_and_sequential_agree() {
    let grid = noise_grid();

    let mut a = mixed_regions();
    let parallel = ZonalOverlay::new(&ZonalConfig::default())
        .compute(&grid, &mut a)
        .unwrap();

    let mut b = mixed_regions();
    let sequential = ZonalOverlay::new(&ZonalConfig {
        parallel: false,
        ..ZonalConfig::default()
    })
    .compute(&grid, &mut b)
    .unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(a, b);
}

#[test]
fn repeated_runs_are_identical() {
    let grid = noise_grid();
    let mut regions = mixed_regions();
    let first = compute_zonal_max(&grid, &mut regions).unwrap();
    let second = compute_zonal_max(&grid, &mut regions).unwrap();
    assert_eq!(first, second);
}

#[test]
fn single_contained_cell_yields_its_value() {
    let grid = RasterGrid::new(
        GridGeometry::north_up(-10.0, 40.0, 1.0, 10, 10),
        create_test_grid(10, 10),
        Some(ND),
        Some(CrsCode::WGS84),
    )
    .unwrap();
    // Only the center of (row 4, col 6) at (-3.5, 35.5) is inside
    let mut regions = RegionSet::new(vec![square("one", -3.9, 35.1, -3.1, 35.9)]).unwrap();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();
    assert_eq!(table.rows()[0].value, Some(6004.0));
}

#[test]
fn region_outside_grid_is_no_data_not_zero() {
    let grid = noise_grid();
    let mut regions = RegionSet::new(vec![square("far", 100.0, -10.0, 110.0, 0.0)]).unwrap();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();
    assert_eq!(table.rows()[0].value, None);
    assert_eq!(table.counts().no_data, 1);
}

#[test]
fn region_over_nodata_only_is_no_data() {
    let grid = RasterGrid::new(
        GridGeometry::north_up(0.0, 3.0, 1.0, 3, 3),
        vec![1.0, 1.0, 1.0, 1.0, ND, 1.0, 1.0, 1.0, 1.0],
        Some(ND),
        Some(CrsCode::WGS84),
    )
    .unwrap();
    let mut regions = RegionSet::new(vec![square("center", 1.2, 1.2, 1.8, 1.8)]).unwrap();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();
    assert_eq!(table.rows()[0].value, None);
}

#[test]
fn nodata_is_excluded_not_minimal() {
    let grid = RasterGrid::new(
        GridGeometry::north_up(0.0, 2.0, 1.0, 2, 2),
        vec![2.0, 5.0, 9.0, ND],
        Some(ND),
        Some(CrsCode::WGS84),
    )
    .unwrap();
    let mut regions = RegionSet::new(vec![square("all", 0.0, 0.0, 2.0, 2.0)]).unwrap();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();
    assert_eq!(table.rows()[0].value, Some(9.0));
}

#[test]
fn hole_excludes_peak() {
    // Peak of 9 at the center cell (row 2, col 2), falling off outward
    let grid = RasterGrid::new(
        GridGeometry::north_up(0.0, 5.0, 1.0, 5, 5),
        create_intensity_grid(5, 5, 2, 2, 9.0, 1.0),
        None,
        Some(CrsCode::WGS84),
    )
    .unwrap();

    let outer = rings::square(0.0, 0.0, 5.0, 5.0);
    let hole = rings::square(1.2, 1.2, 3.8, 3.8);

    let mut regions = RegionSet::new(vec![
        PolygonRegion::new("solid", vec![Ring::new(outer.clone())], Some(CrsCode::WGS84)),
        PolygonRegion::new(
            "holed",
            vec![Ring::new(outer), Ring::new(hole)],
            Some(CrsCode::WGS84),
        ),
    ])
    .unwrap();

    let table = compute_zonal_max(&grid, &mut regions).unwrap();
    assert_eq!(table.rows()[0].value, Some(9.0));
    // Inner 3x3 block removed; best remaining cell is an edge midpoint at distance 2
    assert_eq!(table.rows()[1].value, Some(7.0));
}

#[test]
fn multipolygon_parts_both_contribute() {
    let grid = RasterGrid::new(
        GridGeometry::north_up(0.0, 1.0, 1.0, 6, 1),
        vec![1.0, 2.0, 30.0, 4.0, 5.0, 60.0],
        None,
        Some(CrsCode::WGS84),
    )
    .unwrap();

    let region = PolygonRegion::multi(
        "islands",
        vec![
            Polygon::from_coords(vec![rings::square(0.0, 0.0, 1.0, 1.0)]),
            Polygon::from_coords(vec![rings::square(4.0, 0.0, 5.0, 1.0)]),
        ],
        Some(CrsCode::WGS84),
    );
    let mut regions = RegionSet::new(vec![region]).unwrap();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();
    // Columns 0 and 4 only; 30 and 60 lie between or beyond the parts
    assert_eq!(table.rows()[0].value, Some(5.0));
}

#[test]
fn degenerate_ring_is_fatal() {
    let grid = noise_grid();
    let mut regions = RegionSet::new(vec![
        square("fine", -9.0, 31.0, -8.0, 32.0),
        PolygonRegion::new(
            "line",
            vec![Ring::new(vec![(-5.0, 35.0), (-4.0, 36.0)])],
            Some(CrsCode::WGS84),
        ),
    ])
    .unwrap();

    match compute_zonal_max(&grid, &mut regions) {
        Err(ZonalError::InvalidGeometry { region, .. }) => assert_eq!(region, "line"),
        other => panic!("expected InvalidGeometry, got {other:?}"),
    }
}

#[test]
fn overlay_requires_matching_crs() {
    let grid = noise_grid();
    let mut regions = RegionSet::new(vec![PolygonRegion::new(
        "undeclared",
        vec![Ring::new(rings::square(-9.0, 31.0, -8.0, 32.0))],
        None,
    )])
    .unwrap();

    assert!(matches!(
        compute_zonal_max(&grid, &mut regions),
        Err(ZonalError::MissingCrs(_))
    ));

    let mut regions = CrsNormalizer::new(CrsCode::WGS84)
        .with_assumed(CrsCode::WGS84)
        .normalize_regions(regions)
        .unwrap();
    assert!(compute_zonal_max(&grid, &mut regions).is_ok());
}

#[test]
fn mercator_pipeline_matches_geographic() {
    // Grid in Web Mercator, regions in WGS84: normalize the regions into the grid CRS
    let geographic = RasterGrid::new(
        GridGeometry::north_up(-10.0, 36.0, 0.5, 16, 12),
        create_intensity_grid(16, 12, 8, 6, 9.0, 3.0),
        Some(ND),
        Some(CrsCode::WGS84),
    )
    .unwrap();
    let mercator_grid = CrsNormalizer::new(CrsCode::WEB_MERCATOR)
        .normalize_grid(geographic.clone())
        .unwrap();

    let regions = RegionSet::new(vec![square("whole", -10.0, 30.0, -2.0, 36.0)]).unwrap();
    let mut projected = CrsNormalizer::new(CrsCode::WEB_MERCATOR)
        .normalize_regions(regions.clone())
        .unwrap();
    let mut plain = regions;

    let via_mercator = compute_zonal_max(&mercator_grid, &mut projected).unwrap();
    let direct = compute_zonal_max(&geographic, &mut plain).unwrap();
    assert_eq!(via_mercator.rows()[0].value, direct.rows()[0].value);
}

#[test]
fn exported_pairs_round_trip() {
    let grid = noise_grid();
    let mut regions = mixed_regions();
    let table = compute_zonal_max(&grid, &mut regions).unwrap();

    let text = to_csv(&table).unwrap();
    assert!(text.starts_with("code_commu,OUT_max\n"));
    assert!(text.contains("\noutside,\n"));

    let pairs = parse_result_pairs(&text, &FieldNames::default()).unwrap();
    assert_eq!(pairs, table.exported_pairs());
}
