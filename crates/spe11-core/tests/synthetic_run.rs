use spe11_core::adapter::load_simulation_data;
use spe11_core::domain::{
    CaseVariant, OutputKinds, ReaderBackend, RunConfig, SparseSource,
};
use spe11_core::modules::run_reduction;
use spe11_core::readers::ecl::{EclData, EclFile, EclKeyword};
use spe11_core::readers::open_simulation_output;
use spe11_core::readers::run_files::EclGrid;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DIMS: [usize; 3] = [4, 1, 2];
const CELL_SIZE: [f64; 3] = [0.7, 1.0, 0.6];
const INACTIVE: usize = 3;
const FIPNUM: [i32; 7] = [2, 8, 4, 9, 5, 3, 6];
const SATNUM: [i32; 7] = [2, 2, 2, 2, 1, 2, 1];
/// Global cells of the sensor regions 8 and 9.
const SENSOR_BLOCKS: [i32; 2] = [2, 5];
const REPORT_STEPS: usize = 3;

fn active_globals() -> Vec<usize> {
    (0..DIMS.iter().product::<usize>())
        .filter(|global| *global != INACTIVE)
        .collect()
}

fn reals(values: impl IntoIterator<Item = f64>) -> Vec<f32> {
    values.into_iter().map(|value| value as f32).collect()
}

fn write(path: PathBuf, keywords: Vec<EclKeyword>) {
    EclFile::from_keywords(keywords)
        .write(&path)
        .unwrap_or_else(|error| panic!("{} should be written: {error}", path.display()));
}

/// Writes a two-layer lab-scale run with one inactive cell under
/// `root/<name>` and returns the run directory.
fn write_run(root: &Path, name: &str, actnum: Vec<i32>) -> PathBuf {
    let run_dir = root.join(name);
    let flow = run_dir.join("flow");
    let deck = run_dir.join("deck");
    fs::create_dir_all(&flow).expect("flow dir");
    fs::create_dir_all(&deck).expect("deck dir");
    let file = |extension: &str| flow.join(format!("{}.{extension}", name.to_uppercase()));

    let grid = EclGrid::cartesian(DIMS, CELL_SIZE, Some(actnum));
    write(file("EGRID"), grid.to_keywords());

    let total = DIMS.iter().product::<usize>();
    let active = total - 1;
    write(
        file("INIT"),
        vec![
            EclKeyword::reals(
                "PORV",
                reals((0..total).map(|global| if global == INACTIVE { 0.0 } else { 0.2 })),
            ),
            EclKeyword::ints("SATNUM", SATNUM.to_vec()),
            EclKeyword::ints("FIPNUM", FIPNUM.to_vec()),
            EclKeyword::reals("DX", reals(vec![CELL_SIZE[0]; active])),
            EclKeyword::reals("DY", reals(vec![CELL_SIZE[1]; active])),
            EclKeyword::reals("DZ", reals(vec![CELL_SIZE[2]; active])),
        ],
    );

    let mut restart = Vec::new();
    for step in 0..REPORT_STEPS {
        let s = step as f64;
        restart.push(EclKeyword::ints("SEQNUM", vec![step as i32]));
        restart.push(EclKeyword::reals(
            "SGAS",
            reals((0..active).map(|cell| 0.1 * s * (cell % 2) as f64)),
        ));
        restart.push(EclKeyword::reals("RSW", reals(vec![2.0 * s; active])));
        restart.push(EclKeyword::reals("PRESSURE", reals(vec![100.0 + s; active])));
        restart.push(EclKeyword::reals("GAS_DEN", reals(vec![600.0; active])));
        restart.push(EclKeyword::reals("WAT_DEN", reals(vec![1000.0; active])));
        restart.push(EclKeyword::reals(
            "GASKR",
            reals((0..active).map(|cell| if cell < 3 { 0.2 * s } else { 0.0 })),
        ));
    }
    write(file("UNRST"), restart);

    let mut keywords = vec!["TIME".to_string(), "FGIP".to_string()];
    let mut nums = vec![0, 0];
    for keyword in ["RGCDM", "RGCDI", "RWCD"] {
        for region in 1..=9 {
            keywords.push(keyword.to_string());
            nums.push(region);
        }
    }
    for block in SENSOR_BLOCKS {
        keywords.push("BGPR".to_string());
        nums.push(block);
    }
    let columns = keywords.len();
    write(
        file("SMSPEC"),
        vec![
            EclKeyword::ints(
                "DIMENS",
                vec![columns as i32, DIMS[0] as i32, DIMS[1] as i32, DIMS[2] as i32, 0, -1],
            ),
            EclKeyword::strings("KEYWORDS", keywords.clone()),
            EclKeyword::strings("WGNAMES", vec![":+:+:+:+".to_string(); columns]),
            EclKeyword::ints("NUMS", nums.clone()),
        ],
    );

    let mut unsmry = Vec::new();
    for report in 1..REPORT_STEPS {
        let r = report as f64;
        unsmry.push(EclKeyword::ints("SEQHDR", vec![report as i32]));
        unsmry.push(EclKeyword::ints("MINISTEP", vec![report as i32 - 1]));
        let params = keywords
            .iter()
            .zip(&nums)
            .map(|(keyword, num)| match keyword.as_str() {
                "TIME" => 1_800.0 * r / 86_400.0,
                "FGIP" => 10.0 * r,
                "BGPR" => 100.0 + r,
                _ => r * f64::from(*num),
            })
            .collect::<Vec<_>>();
        unsmry.push(EclKeyword::new("PARAMS", EclData::Real(reals(params))));
    }
    write(file("UNSMRY"), unsmry);

    fs::write(
        flow.join(format!("{}.INFOSTEP", name.to_uppercase())),
        "Time(day) TStep(day) Assembly Wells LinSolve Update Output Conv NewtIt LinIt Cut\n\
         0.0 0.01 0.1 0 0.2 0.05 0.05 0 3 2 10 1\n\
         0.01 0.015 0.1 0 0.2 0.05 0.05 0 3 2 10 1\n\
         0.025 0.005 0.1 0 0.2 0.05 0.05 0 3 2 10 0\n\
         0.025 0.005 0.1 0 0.2 0.05 0.05 0 3 2 10 1\n",
    )
    .expect("solver log");
    fs::write(deck.join("dt.txt"), "0\n0\n0 1800 3600\n").expect("time metadata");

    let centers = active_globals()
        .into_iter()
        .map(|global| {
            let (i, k) = (global % DIMS[0], global / DIMS[0]);
            format!(
                "{},{},{}",
                CELL_SIZE[0] * (i as f64 + 0.5),
                0.5,
                CELL_SIZE[2] * (k as f64 + 0.5)
            )
        })
        .collect::<Vec<_>>();
    fs::write(deck.join("centers.txt"), centers.join("\n")).expect("centers");

    run_dir
}

fn default_actnum() -> Vec<i32> {
    (0..DIMS.iter().product::<usize>())
        .map(|global| i32::from(global != INACTIVE))
        .collect()
}

fn config(run_dir: &Path, generate: &str, load: SparseSource, backend: ReaderBackend) -> RunConfig {
    RunConfig {
        path: run_dir.to_path_buf(),
        case: CaseVariant::Spe11a,
        deck_name: None,
        resolution: [4, 1, 2],
        spatial_interval: 1.0,
        sparse_interval: 0.5,
        load,
        generate: generate.parse::<OutputKinds>().expect("output kinds"),
        backend,
    }
}

fn read_table(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap_or_else(|error| panic!("{} should be readable: {error}", path.display()))
        .lines()
        .skip(1)
        .map(|line| line.split(',').map(|field| field.trim().to_string()).collect())
        .collect()
}

#[test]
fn both_backends_agree_on_active_cells_and_centers() {
    let temp = TempDir::new().expect("tempdir should be created");
    let run_dir = write_run(temp.path(), "synth", default_actnum());

    let mut loaded = Vec::new();
    for backend in [ReaderBackend::Resdata, ReaderBackend::Opm] {
        let request = config(&run_dir, "sparse", SparseSource::Summary, backend)
            .to_request()
            .expect("request");
        assert_eq!(request.deck_name, "SYNTH");
        let output = open_simulation_output(&request).expect("output");
        let data = load_simulation_data(output.as_ref(), &request).expect("data");
        assert_eq!(data.grid.total_cells(), 8);
        assert_eq!(data.grid.active_cells(), 7);
        assert_eq!(data.grid.active_to_global(), active_globals().as_slice());
        loaded.push(data);
    }

    for (native, table) in loaded[0].cell_centers.iter().zip(&loaded[1].cell_centers) {
        for axis in 0..3 {
            assert!((native[axis] - table[axis]).abs() < 1.0e-5);
        }
    }
    // Elevation: the bottom layer sits at 0.3 m above the domain base.
    assert!((loaded[1].cell_centers[6][2] - 0.3).abs() < 1.0e-9);
}

#[test]
fn disagreeing_active_flags_are_rejected() {
    let temp = TempDir::new().expect("tempdir should be created");
    let run_dir = write_run(temp.path(), "synth", vec![1; 8]);
    let request = config(&run_dir, "sparse", SparseSource::Summary, ReaderBackend::Resdata)
        .to_request()
        .expect("request");
    let output = open_simulation_output(&request).expect("output");

    let error = load_simulation_data(output.as_ref(), &request).expect_err("mismatch");
    assert_eq!(error.placeholder(), "INPUT.ACTIVE_CELL_MISMATCH");
    assert_eq!(error.exit_code(), 2);
}

#[test]
fn full_reduction_writes_every_output_kind() {
    let temp = TempDir::new().expect("tempdir should be created");
    let run_dir = write_run(temp.path(), "synth", default_actnum());
    let request = config(&run_dir, "all", SparseSource::Restart, ReaderBackend::Resdata)
        .to_request()
        .expect("request");

    let artifacts = run_reduction(&request).expect("reduction");
    assert_eq!(artifacts.len(), 4);

    let data_dir = run_dir.join("data");
    let performance = read_table(&data_dir.join("spe11a_performance_time_series.csv"));
    assert_eq!(performance.len(), 3);
    assert_eq!(performance[0], vec!["0.000e+00"; 10]);
    // One failed step in the second interval.
    assert_eq!(performance[2][2], "1.000e+00");
    assert_eq!(performance[1][4], "1.400e+01");

    let sparse = read_table(&data_dir.join("spe11a_time_series.csv"));
    assert_eq!(sparse.len(), 3);
    assert!(sparse.iter().all(|row| row.len() == 13));
    assert_eq!(sparse[0][1], "1.000e+07");
    assert_eq!(sparse[2][1], "1.020e+07");

    for label in ["0h", "1h"] {
        let map = read_table(&data_dir.join(format!("spe11a_spatial_map_{label}.csv")));
        assert_eq!(map.len(), 8);
        assert!(map.iter().all(|row| row.len() == 9));
        // The output cell over the inactive cell maps to an active neighbor.
        assert!(map.iter().all(|row| row[2] != "nan"));
    }
}

#[test]
fn summary_and_restart_sources_report_the_same_sensor_pressures() {
    let temp = TempDir::new().expect("tempdir should be created");
    let run_dir = write_run(temp.path(), "synth", default_actnum());

    let mut tables = Vec::new();
    for load in [SparseSource::Summary, SparseSource::Restart] {
        let request = config(&run_dir, "sparse", load, ReaderBackend::Resdata)
            .to_request()
            .expect("request");
        run_reduction(&request).expect("reduction");
        tables.push(read_table(&run_dir.join("data/spe11a_time_series.csv")));
    }

    let sensors = |table: &[Vec<String>]| {
        table
            .iter()
            .map(|row| row[1..3].to_vec())
            .collect::<Vec<_>>()
    };
    assert_eq!(sensors(&tables[0]), sensors(&tables[1]));
}
