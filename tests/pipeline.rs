use movies_cleaner::config::{CleanConfig, RatingsKeep, RuntimePolicy};
use movies_cleaner::parse::parse_array;
use movies_cleaner::{run, Rejection};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MOVIES: &str = r#"id,title,release_date,vote_count,vote_average,runtime,genres,belongs_to_collection
862,Toy Story,1995-10-30,5415,7.7,81.0,"[{'id': 16, 'name': 'Animation'}, {'id': 35, 'name': 'Comedy'}]","{'id': 10194, 'name': 'Toy Story Collection', 'poster_path': None}"
8844,Jumanji,1995-12-15,2413,6.9,104.0,"[{'id': 12, 'name': 'Adventure'}]",
862,Toy Story (again),1995-10-30,1,1.0,81.0,[],
1997-08-20,Shifted,,,,,,
99999,Endless,2011-01-01,10,5.0,5000,[],
12,,2000-01-01,10,5.0,90,[],
13,Too Old,1850-01-01,10,5.0,90,[],
14,"Ocean's ""Eleven""",2001-12-07,3000,7.3,116,"[{""id"": 80, ""name"": ""Crime""}]",
"#;

const CREDITS: &str = r#"cast,crew,id
"[{'name': 'A'}, {'name': 'B'}, {'name': 'C'}]","[{'name': 'D'}, {'name': 'E'}]",42
"[{'name': 'c0'}, {'name': 'c1'}, {'name': 'c2'}, {'name': 'c3'}, {'name': 'c4'}, {'name': 'c5'}, {'name': 'c6'}, {'name': 'c7'}, {'name': 'c8'}, {'name': 'c9'}]","[{'name': 'Z', 'job': 'Director'}]",42
[],[],7
"[{'name': 'X'}]",[],7
[],[],abc
"#;

const LINKS: &str = "movieId,imdbId,tmdbId\n1,0114709,862\n2,0113497,8844\n3,0113228,\n1,0114709,999\n";

const RATINGS: &str = "userId,movieId,rating,timestamp\n1,5,9.5,1000000000\n1,5,3.0,1100000000\n2,5,11,1000000000\n2,6,4.0,1000000000\n";

const KEYWORDS: &str = r#"id,keywords
862,"[{'id': 931, 'name': 'Jealousy'}, {'id': 4290, 'name': 'toy'}, {'id': 4290, 'name': 'TOY'}]"
862,"[{'id': 1, 'name': 'other'}]"
8844,"[{'id': 10090, 'name': 'board game'}]"
x,[]
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        fs::create_dir(&raw).unwrap();
        fs::write(raw.join("movies_metadata.csv"), MOVIES).unwrap();
        fs::write(raw.join("credits.csv"), CREDITS).unwrap();
        fs::write(raw.join("links.csv"), LINKS).unwrap();
        fs::write(raw.join("ratings.csv"), RATINGS).unwrap();
        fs::write(raw.join("keywords.csv"), KEYWORDS).unwrap();
        Self { dir }
    }

    fn raw(&self) -> PathBuf {
        self.dir.path().join("raw")
    }

    fn config(&self, out: &str) -> CleanConfig {
        CleanConfig {
            in_dir: self.raw(),
            out_dir: self.dir.path().join(out),
            ratings_chunk_size: 1,
            chunk_size: 2,
            show_progress: false,
            ..CleanConfig::default()
        }
    }
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn column(path: &Path, name: &str) -> Vec<String> {
    let (header, rows) = read_rows(path);
    let idx = header.iter().position(|h| h == name).unwrap();
    rows.into_iter().map(|row| row[idx].clone()).collect()
}

#[test]
fn movies_are_filtered_and_counted() {
    let fixture = Fixture::new();
    let config = fixture.config("out");
    let report = run(&config).unwrap();

    let stats = report.get("movies").unwrap();
    assert_eq!(stats.rows_read, 8);
    assert_eq!(stats.rows_kept, 3);
    assert_eq!(stats.rejected(Rejection::Duplicate), 1);
    assert_eq!(stats.rejected(Rejection::BadId), 1);
    assert_eq!(stats.rejected(Rejection::MissingTitle), 1);
    assert_eq!(stats.rejected(Rejection::YearOutOfRange), 1);
    assert_eq!(stats.rejected(Rejection::RuntimeTooLong), 1);

    let out = config.out_dir.join("movies_clean.csv");
    assert_eq!(column(&out, "id"), vec!["862", "8844", "14"]);
    assert_eq!(column(&out, "title")[2], "Ocean's \"Eleven\"");
    assert_eq!(column(&out, "release_date")[0], "1995-10-30");
    assert_eq!(column(&out, "year")[0], "1995");
    assert_eq!(
        column(&out, "genres")[0],
        r#"[{"id":16,"name":"Animation"},{"id":35,"name":"Comedy"}]"#
    );
    assert_eq!(column(&out, "belongs_to_collection")[1], "");
}

#[test]
fn runtime_never_exceeds_cap() {
    let fixture = Fixture::new();
    let config = CleanConfig {
        runtime_policy: RuntimePolicy::Clamp,
        ..fixture.config("out")
    };
    let report = run(&config).unwrap();
    assert_eq!(report.get("movies").unwrap().rows_kept, 4);

    let out = config.out_dir.join("movies_clean.csv");
    let ids = column(&out, "id");
    let runtimes = column(&out, "runtime");
    let endless = ids.iter().position(|id| id == "99999").unwrap();
    assert_eq!(runtimes[endless], "873");
    for runtime in runtimes.iter().filter(|r| !r.is_empty()) {
        assert!(runtime.parse::<u32>().unwrap() <= config.max_runtime);
    }
}

#[test]
fn credits_keep_richest_duplicate() {
    let fixture = Fixture::new();
    let config = fixture.config("out");
    let report = run(&config).unwrap();

    let stats = report.get("credits").unwrap();
    assert_eq!(stats.rows_kept, 2);
    assert_eq!(stats.rejected(Rejection::Duplicate), 2);
    assert_eq!(stats.rejected(Rejection::BadId), 1);

    let out = config.out_dir.join("credits_clean.csv");
    let (_, rows) = read_rows(&out);
    assert_eq!(rows[0][0], "42");
    assert_eq!(parse_array(&rows[0][1]).unwrap().len(), 10);
    assert_eq!(parse_array(&rows[0][2]).unwrap().len(), 1);
    assert_eq!(rows[1][0], "7");
    assert_eq!(parse_array(&rows[1][1]).unwrap().len(), 1);
}

#[test]
fn links_null_tmdb_follows_flag() {
    let fixture = Fixture::new();
    let config = fixture.config("dropped");
    let report = run(&config).unwrap();
    let stats = report.get("links").unwrap();
    assert_eq!(stats.rejected(Rejection::NullTmdbId), 1);
    assert_eq!(stats.rejected(Rejection::Duplicate), 1);
    let out = config.out_dir.join("links_clean.csv");
    assert_eq!(column(&out, "movieId"), vec!["1", "2"]);
    assert_eq!(column(&out, "imdbId"), vec!["114709", "113497"]);

    let config = CleanConfig {
        keep_null_tmdb: true,
        ..fixture.config("kept")
    };
    run(&config).unwrap();
    let out = config.out_dir.join("links_clean.csv");
    assert_eq!(column(&out, "movieId"), vec!["1", "2", "3"]);
    assert_eq!(column(&out, "tmdbId"), vec!["862", "8844", ""]);
}

fn ratings_with(fixture: &Fixture, keep: RatingsKeep) -> Vec<RatingRow> {
    let config = CleanConfig {
        ratings_keep: keep,
        ..fixture.config(&format!("ratings_{keep:?}"))
    };
    let report = run(&config).unwrap();
    assert_eq!(report.get("ratings").unwrap().rejected(Rejection::BadRating), 1);

    let (_, rows) = read_rows(&config.out_dir.join("ratings_clean.csv"));
    rows.into_iter()
        .map(|r| (r[0].clone(), r[1].clone(), r[2].parse().unwrap(), r[3].clone()))
        .collect()
}

type RatingRow = (String, String, f64, String);

fn rating(user: &str, movie: &str, value: f64, ts: &str) -> RatingRow {
    (user.to_string(), movie.to_string(), value, ts.to_string())
}

#[test]
fn ratings_policy_across_chunks() {
    let fixture = Fixture::new();

    let last = ratings_with(&fixture, RatingsKeep::Last);
    assert_eq!(
        last,
        vec![
            rating("1", "5", 3.0, "2004-11-09 11:33:20"),
            rating("2", "6", 4.0, "2001-09-09 01:46:40"),
        ]
    );

    let first = ratings_with(&fixture, RatingsKeep::First);
    assert_eq!(
        first,
        vec![
            rating("1", "5", 9.5, "2001-09-09 01:46:40"),
            rating("2", "6", 4.0, "2001-09-09 01:46:40"),
        ]
    );

    let all = ratings_with(&fixture, RatingsKeep::All);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].2, 9.5);
    assert_eq!(all[1].2, 3.0);
}

#[test]
fn last_rating_is_written_where_it_last_appears() {
    let fixture = Fixture::new();
    fs::write(
        fixture.raw().join("ratings.csv"),
        "userId,movieId,rating,timestamp\n\
         1,5,9.5,1000000000\n\
         2,6,4.0,1000000000\n\
         3,7\n\
         2,5,11,1000000000\n\
         1,5,2.5,1100000000\n\
         4,8,1.0,1000000000\n",
    )
    .unwrap();
    let config = fixture.config("out");

    let report = run(&config).unwrap();
    let stats = report.get("ratings").unwrap();
    assert_eq!(stats.rows_read, 6);
    assert_eq!(stats.rejected(Rejection::MalformedRow), 1);
    assert_eq!(stats.rejected(Rejection::BadRating), 1);
    assert_eq!(stats.rejected(Rejection::Duplicate), 1);
    assert_eq!(stats.rows_kept, 3);

    let (_, rows) = read_rows(&config.out_dir.join("ratings_clean.csv"));
    let kept: Vec<(&str, &str, f64)> = rows
        .iter()
        .map(|r| (r[0].as_str(), r[1].as_str(), r[2].parse().unwrap()))
        .collect();
    assert_eq!(kept, vec![("2", "6", 4.0), ("1", "5", 2.5), ("4", "8", 1.0)]);
}

#[test]
fn keep_all_still_reports_duplicates() {
    let fixture = Fixture::new();
    let config = CleanConfig {
        ratings_keep: RatingsKeep::All,
        ..fixture.config("out")
    };
    let report = run(&config).unwrap();
    let stats = report.get("ratings").unwrap();
    assert_eq!(stats.duplicates_kept, 1);
    assert_eq!(stats.rejected(Rejection::Duplicate), 0);
    assert_eq!(stats.rows_kept, 3);
}

#[test]
fn keywords_are_cleaned_and_exploded() {
    let fixture = Fixture::new();
    let config = CleanConfig {
        explode_keywords: true,
        ..fixture.config("out")
    };
    let report = run(&config).unwrap();

    let stats = report.get("keywords").unwrap();
    assert_eq!(stats.rows_kept, 2);
    assert_eq!(stats.rejected(Rejection::Duplicate), 1);
    assert_eq!(stats.rejected(Rejection::BadId), 1);

    let exploded = report.get("keywords_exploded").unwrap();
    assert_eq!(exploded.rows_read, 4);
    assert_eq!(exploded.rows_kept, 3);

    let out = config.out_dir.join("keywords_exploded.csv");
    let (header, rows) = read_rows(&out);
    assert_eq!(header, vec!["movie_id", "keyword"]);
    assert_eq!(
        rows,
        vec![
            vec!["862", "jealousy"],
            vec!["862", "toy"],
            vec!["8844", "board game"],
        ]
    );
}

#[test]
fn primary_keys_are_unique() {
    let fixture = Fixture::new();
    let config = fixture.config("out");
    run(&config).unwrap();

    for (file, key) in [
        ("movies_clean.csv", "id"),
        ("credits_clean.csv", "id"),
        ("links_clean.csv", "movieId"),
        ("keywords_clean.csv", "id"),
    ] {
        let keys = column(&config.out_dir.join(file), key);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len(), "{file}");
    }

    let (_, rows) = read_rows(&config.out_dir.join("ratings_clean.csv"));
    let pairs: HashSet<_> = rows.iter().map(|r| (r[0].clone(), r[1].clone())).collect();
    assert_eq!(pairs.len(), rows.len());
}

#[test]
fn array_columns_reparse() {
    let fixture = Fixture::new();
    let config = fixture.config("out");
    run(&config).unwrap();

    let out = config.out_dir.join("movies_clean.csv");
    for column_name in [
        "genres",
        "production_companies",
        "production_countries",
        "spoken_languages",
    ] {
        for cell in column(&out, column_name) {
            let parsed = parse_array(&cell).unwrap();
            assert_eq!(
                movies_cleaner::parse::canonical_json(&parsed),
                cell,
                "{column_name}"
            );
        }
    }
}

#[test]
fn reruns_are_byte_identical() {
    let fixture = Fixture::new();
    let first = CleanConfig {
        explode_keywords: true,
        ..fixture.config("first")
    };
    let second = CleanConfig {
        explode_keywords: true,
        ..fixture.config("second")
    };
    run(&first).unwrap();
    run(&second).unwrap();
    run(&second).unwrap();

    for file in [
        "movies_clean.csv",
        "credits_clean.csv",
        "links_clean.csv",
        "ratings_clean.csv",
        "keywords_clean.csv",
        "keywords_exploded.csv",
    ] {
        assert_eq!(
            fs::read(first.out_dir.join(file)).unwrap(),
            fs::read(second.out_dir.join(file)).unwrap(),
            "{file}"
        );
    }
}

#[test]
fn missing_required_input_aborts_before_writing() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.raw().join("ratings.csv")).unwrap();
    let config = fixture.config("out");

    let err = run(&config).unwrap_err();
    assert!(err.to_string().contains("ratings.csv"), "{err}");
    assert!(!config.out_dir.exists());
}

#[test]
fn invalid_configuration_aborts_before_writing() {
    let fixture = Fixture::new();
    let config = CleanConfig {
        year_min: 2000,
        year_max: 1990,
        ..fixture.config("out")
    };
    assert!(run(&config).is_err());
    assert!(!config.out_dir.exists());
}

#[test]
fn unwritable_output_dir_aborts() {
    let fixture = Fixture::new();
    let blocker = fixture.dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let config = CleanConfig {
        out_dir: blocker.join("out"),
        ..fixture.config("unused")
    };

    let err = run(&config).unwrap_err();
    assert!(err.to_string().contains("output directory"), "{err}");
    assert!(err.to_string().contains("blocker"), "{err}");
}

#[test]
fn missing_keywords_is_skipped() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.raw().join("keywords.csv")).unwrap();
    let config = fixture.config("out");

    let report = run(&config).unwrap();
    assert!(report.get("keywords").is_none());
    assert_eq!(report.entities.len(), 4);
    assert!(!config.out_dir.join("keywords_clean.csv").exists());
}

#[test]
fn gzip_ratings_are_read() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let fixture = Fixture::new();
    let raw = fixture.raw();
    fs::remove_file(raw.join("ratings.csv")).unwrap();
    let mut encoder = GzEncoder::new(
        fs::File::create(raw.join("ratings.csv.gz")).unwrap(),
        Compression::default(),
    );
    encoder.write_all(RATINGS.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let config = fixture.config("out");
    let report = run(&config).unwrap();
    assert_eq!(report.get("ratings").unwrap().rows_read, 4);
    assert_eq!(report.get("ratings").unwrap().rows_kept, 2);
}
