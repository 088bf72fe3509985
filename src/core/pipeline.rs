use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformOutput};
use crate::domain::mapping;
use crate::domain::model::{CourseConfiguration, Hole, RejectedRow, SubCourse};
use crate::domain::scoring::{format_to_par, ScoreClass};
use crate::utils::error::{MigrationError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Insert order matters: holes and scores reference rows loaded before them.
const TABLE_ORDER: [&str; 5] = ["courses", "sub_courses", "configurations", "holes", "scores"];

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// The one concrete migration pipeline: reads CSV/JSON export files, fixes up
/// course data through the hole-numbering mapper, and inserts the surviving
/// rows into the target instance's REST API.
pub struct CsvImportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> CsvImportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    fn parse_csv(&self, table: &str, bytes: &[u8]) -> Result<Vec<Record>> {
        let mut reader = csv::Reader::from_reader(bytes);
        let headers = reader.headers()?.clone();
        let mut records = Vec::new();

        for row in reader.records() {
            let row = row?;
            let mut record = Record::new(table);
            for (header, field) in headers.iter().zip(row.iter()) {
                record.data.insert(
                    header.to_string(),
                    serde_json::Value::String(field.to_string()),
                );
            }
            records.push(record);
        }

        Ok(records)
    }

    fn parse_json(&self, table: &str, bytes: &[u8]) -> Result<Vec<Record>> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(MigrationError::ProcessingError {
                    message: format!(
                        "Expected a JSON array for table {}, got {}",
                        table,
                        type_name(&other)
                    ),
                })
            }
        };

        let mut records = Vec::new();
        for item in items {
            match item {
                serde_json::Value::Object(obj) => {
                    let mut record = Record::new(table);
                    record.data.extend(obj);
                    records.push(record);
                }
                other => {
                    tracing::warn!("Skipping non-object entry in {}: {}", table, other);
                }
            }
        }

        Ok(records)
    }

    async fn post_batch(&self, table: &str, batch: &[serde_json::Value]) -> Result<()> {
        let endpoint = self.config.target_endpoint().trim_end_matches('/');
        let url = format!("{}/rest/v1/{}", endpoint, table);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut request = self
                .client
                .post(&url)
                .header("Prefer", "return=minimal")
                .json(batch);

            if let Some(key) = self.config.api_key() {
                request = request
                    .header("apikey", key)
                    .header("Authorization", format!("Bearer {}", key));
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(
                        "Inserted batch of {} into {} (attempt {})",
                        batch.len(),
                        table,
                        attempt
                    );
                    return Ok(());
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    if attempt > self.config.max_retries() {
                        return Err(MigrationError::ApiStatusError { status, body });
                    }
                    tracing::warn!(
                        "Insert into {} failed with status {} (attempt {}), retrying",
                        table,
                        status,
                        attempt
                    );
                }
                Err(e) => {
                    if attempt > self.config.max_retries() {
                        return Err(e.into());
                    }
                    tracing::warn!(
                        "Insert into {} failed: {} (attempt {}), retrying",
                        table,
                        e,
                        attempt
                    );
                }
            }

            tokio::time::sleep(RETRY_DELAY).await;
        }
    }
}

fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn reject(rejected: &mut Vec<RejectedRow>, record: &Record, reason: impl Into<String>) {
    rejected.push(RejectedRow {
        table: record.table.clone(),
        reason: reason.into(),
        row: record.data.clone(),
    });
}

/// Reads a sub-course row into the domain type, keeping its owning course id.
fn parse_sub_course(record: &Record) -> std::result::Result<(String, SubCourse), String> {
    let id = record
        .get_str("id")
        .ok_or("missing id")?
        .to_string();
    let course_id = record.get_str("course_id").unwrap_or_default().to_string();
    let name = record.get_str("name").unwrap_or(&id).to_string();
    let start_hole = record.get_u32("start_hole").ok_or("missing or non-numeric start_hole")?;
    let end_hole = record.get_u32("end_hole").ok_or("missing or non-numeric end_hole")?;

    if start_hole > end_hole {
        return Err(format!(
            "start_hole {} is greater than end_hole {}",
            start_hole, end_hole
        ));
    }

    Ok((
        course_id,
        SubCourse {
            id,
            name,
            start_hole,
            end_hole,
            sequence: record.get_u32("sequence"),
        },
    ))
}

fn parse_hole(record: &Record) -> std::result::Result<(String, Hole), String> {
    let course_id = record.get_str("course_id").unwrap_or_default().to_string();
    let hole_number = record
        .get_u32("hole_number")
        .ok_or("missing or non-numeric hole_number")?;
    let par = record.get_u32("par").ok_or("missing or non-numeric par")?;

    Ok((
        course_id,
        Hole {
            hole_number,
            par,
            yardage: record.get_u32("yardage"),
            handicap: record.get_u32("handicap"),
        },
    ))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CsvImportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        for file in self.config.input_files() {
            let path = Path::new(file);
            let table = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| MigrationError::ProcessingError {
                    message: format!("Cannot derive a table name from {}", file),
                })?
                .to_string();

            tracing::debug!("Reading export file {} (table {})", file, table);
            let bytes = self.storage.read_file(file).await?;

            let parsed = match path.extension().and_then(|e| e.to_str()) {
                Some("csv") => self.parse_csv(&table, &bytes)?,
                Some("json") => self.parse_json(&table, &bytes)?,
                other => {
                    return Err(MigrationError::ProcessingError {
                        message: format!("Unsupported export format for {}: {:?}", file, other),
                    })
                }
            };

            tracing::debug!("Read {} rows from {}", parsed.len(), file);
            records.extend(parsed);
        }

        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformOutput> {
        let mut by_table: HashMap<String, Vec<Record>> = HashMap::new();
        for record in data {
            by_table.entry(record.table.clone()).or_default().push(record);
        }

        let mut output = TransformOutput::default();

        // Sub-courses first: hole and score handling depends on which courses
        // end up with a usable segment set.
        let mut segments_by_course: HashMap<String, Vec<SubCourse>> = HashMap::new();
        let mut segment_records: HashMap<String, Vec<Record>> = HashMap::new();
        for record in by_table.remove("sub_courses").unwrap_or_default() {
            match parse_sub_course(&record) {
                Ok((course_id, sub)) => {
                    segments_by_course.entry(course_id.clone()).or_default().push(sub);
                    segment_records.entry(course_id).or_default().push(record);
                }
                Err(reason) => reject(&mut output.rejected, &record, reason),
            }
        }

        let mut valid_segments: HashMap<String, Vec<SubCourse>> = HashMap::new();
        for (course_id, subs) in segments_by_course {
            let validation = mapping::validate_ranges(&subs);
            if validation.valid {
                for record in segment_records.remove(&course_id).unwrap_or_default() {
                    output
                        .tables
                        .entry("sub_courses".to_string())
                        .or_default()
                        .push(serde_json::to_value(&record.data)?);
                }
                valid_segments.insert(course_id, subs);
            } else {
                let hole = validation.conflicting_hole.unwrap_or_default();
                tracing::warn!(
                    "Course {} has overlapping sub-course ranges at hole {}, skipping its segments",
                    course_id,
                    hole
                );
                for record in segment_records.remove(&course_id).unwrap_or_default() {
                    reject(
                        &mut output.rejected,
                        &record,
                        format!("overlapping sub-course ranges at hole {}", hole),
                    );
                }
            }
        }

        // Configurations pass through as rows, but are also parsed so holes
        // can be filtered down to what any configuration actually plays.
        let mut configs_by_course: HashMap<String, Vec<CourseConfiguration>> = HashMap::new();
        for record in by_table.remove("configurations").unwrap_or_default() {
            let course_id = record.get_str("course_id").unwrap_or_default().to_string();
            match serde_json::from_value::<CourseConfiguration>(serde_json::to_value(&record.data)?)
            {
                Ok(config) => {
                    configs_by_course.entry(course_id).or_default().push(config);
                    output
                        .tables
                        .entry("configurations".to_string())
                        .or_default()
                        .push(serde_json::to_value(&record.data)?);
                }
                Err(e) => reject(&mut output.rejected, &record, format!("bad configuration: {}", e)),
            }
        }

        // Holes: drop the ones no configuration references, then annotate the
        // survivors with their display number under the course's segment set.
        let mut par_by_course_hole: HashMap<(String, u32), u32> = HashMap::new();
        for record in by_table.remove("holes").unwrap_or_default() {
            let (course_id, hole) = match parse_hole(&record) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    reject(&mut output.rejected, &record, reason);
                    continue;
                }
            };

            let configs = configs_by_course.get(&course_id).cloned().unwrap_or_default();
            if mapping::filter_holes(std::slice::from_ref(&hole), &configs).is_empty() {
                reject(
                    &mut output.rejected,
                    &record,
                    "hole not referenced by any configuration",
                );
                continue;
            }

            par_by_course_hole.insert((course_id.clone(), hole.hole_number), hole.par);

            let mut row = record.data.clone();
            if let Some(subs) = valid_segments.get(&course_id) {
                if let Some(display) = mapping::absolute_to_display(hole.hole_number, subs) {
                    row.insert("display_hole".to_string(), serde_json::json!(display));
                }
            }
            output
                .tables
                .entry("holes".to_string())
                .or_default()
                .push(serde_json::to_value(row)?);
        }

        // Scores: classify against the hole's par.
        for record in by_table.remove("scores").unwrap_or_default() {
            let course_id = record.get_str("course_id").unwrap_or_default().to_string();
            let hole_number = match record.get_u32("hole_number") {
                Some(n) => n,
                None => {
                    reject(&mut output.rejected, &record, "missing or non-numeric hole_number");
                    continue;
                }
            };
            let strokes = match record.get_i32("strokes") {
                Some(n) => n,
                None => {
                    reject(&mut output.rejected, &record, "missing or non-numeric strokes");
                    continue;
                }
            };

            let par = match par_by_course_hole.get(&(course_id, hole_number)) {
                Some(&par) => par as i32,
                None => {
                    reject(
                        &mut output.rejected,
                        &record,
                        format!("score references unknown hole {}", hole_number),
                    );
                    continue;
                }
            };

            let diff = strokes - par;
            let mut row = record.data.clone();
            row.insert(
                "score_class".to_string(),
                serde_json::json!(ScoreClass::from(diff).name()),
            );
            row.insert("to_par".to_string(), serde_json::json!(format_to_par(diff)));
            output
                .tables
                .entry("scores".to_string())
                .or_default()
                .push(serde_json::to_value(row)?);
        }

        // Anything else (courses, players, …) is a straight pass-through.
        for (table, records) in by_table {
            for record in records {
                output
                    .tables
                    .entry(table.clone())
                    .or_default()
                    .push(serde_json::to_value(&record.data)?);
            }
        }

        Ok(output)
    }

    async fn load(&self, result: TransformOutput) -> Result<String> {
        let batch_size = self.config.batch_size().max(1);
        let mut inserted = 0usize;
        let mut tables_loaded = 0usize;

        let mut order: Vec<&str> = TABLE_ORDER.to_vec();
        for table in result.tables.keys() {
            if !order.contains(&table.as_str()) {
                order.push(table);
            }
        }

        for table in &order {
            let Some(rows) = result.tables.get(*table) else {
                continue;
            };
            if rows.is_empty() {
                continue;
            }

            if self.config.dry_run() {
                tracing::info!("[dry-run] would insert {} rows into {}", rows.len(), table);
            } else {
                for batch in rows.chunks(batch_size) {
                    self.post_batch(table, batch).await?;
                }
                tracing::info!("Inserted {} rows into {}", rows.len(), table);
            }

            inserted += rows.len();
            tables_loaded += 1;
        }

        let report = serde_json::json!({
            "finished_at": chrono::Utc::now().to_rfc3339(),
            "dry_run": self.config.dry_run(),
            "inserted": result
                .tables
                .iter()
                .map(|(t, rows)| (t.clone(), rows.len()))
                .collect::<HashMap<String, usize>>(),
            "rejected": &result.rejected,
        });
        self.storage
            .write_file(
                "migration_report.json",
                serde_json::to_string_pretty(&report)?.as_bytes(),
            )
            .await?;

        Ok(format!(
            "{} {} rows across {} tables ({} rejected), report at {}/migration_report.json",
            if self.config.dry_run() { "would insert" } else { "inserted" },
            inserted,
            tables_loaded,
            result.rejected.len(),
            self.config.output_path()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files
                .lock()
                .await
                .get(path)
                .cloned()
                .ok_or_else(|| MigrationError::ProcessingError {
                    message: format!("no such file: {}", path),
                })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct TestConfig {
        input_files: Vec<String>,
        dry_run: bool,
    }

    impl ConfigProvider for TestConfig {
        fn target_endpoint(&self) -> &str {
            "http://localhost:1"
        }
        fn api_key(&self) -> Option<&str> {
            None
        }
        fn input_files(&self) -> &[String] {
            &self.input_files
        }
        fn output_path(&self) -> &str {
            "."
        }
        fn batch_size(&self) -> usize {
            50
        }
        fn max_retries(&self) -> u32 {
            0
        }
        fn dry_run(&self) -> bool {
            self.dry_run
        }
    }

    fn pipeline_with(
        files: Vec<(&str, &str)>,
        dry_run: bool,
    ) -> (CsvImportPipeline<MockStorage, TestConfig>, MockStorage) {
        let storage = MockStorage::default();
        let config = TestConfig {
            input_files: files.iter().map(|(p, _)| p.to_string()).collect(),
            dry_run,
        };
        let pipeline = CsvImportPipeline::new(storage.clone(), config);
        (pipeline, storage)
    }

    const SUB_COURSES_CSV: &str = "\
id,course_id,name,start_hole,end_hole,sequence
front,c1,Front 9,1,9,1
back,c1,Back 9,10,18,2
";

    const HOLES_CSV: &str = "\
course_id,hole_number,par,yardage
c1,1,4,390
c1,2,3,175
c1,10,5,520
";

    #[tokio::test]
    async fn extract_reads_csv_and_json_exports() {
        let (pipeline, storage) = pipeline_with(
            vec![("sub_courses.csv", ""), ("configurations.json", "")],
            true,
        );
        storage.put("sub_courses.csv", SUB_COURSES_CSV).await;
        storage
            .put(
                "configurations.json",
                r#"[{"id":"full","course_id":"c1","name":"Full 18","sub_courses":[]}]"#,
            )
            .await;

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].table, "sub_courses");
        assert_eq!(records[0].get_u32("end_hole"), Some(9));
        assert_eq!(records[2].table, "configurations");
        assert_eq!(records[2].get_str("name"), Some("Full 18"));
    }

    #[tokio::test]
    async fn extract_rejects_unknown_extension() {
        let (pipeline, storage) = pipeline_with(vec![("holes.xlsx", "")], true);
        storage.put("holes.xlsx", "junk").await;

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, MigrationError::ProcessingError { .. }));
    }

    #[tokio::test]
    async fn transform_annotates_holes_with_display_numbers() {
        let (pipeline, _storage) = pipeline_with(vec![], true);

        let mut records = pipeline.parse_csv("sub_courses", SUB_COURSES_CSV.as_bytes()).unwrap();
        records.extend(pipeline.parse_csv("holes", HOLES_CSV.as_bytes()).unwrap());

        let output = pipeline.transform(records).await.unwrap();
        assert!(output.rejected.is_empty());

        let holes = &output.tables["holes"];
        assert_eq!(holes.len(), 3);
        assert_eq!(holes[0]["display_hole"], serde_json::json!(1));
        assert_eq!(holes[2]["display_hole"], serde_json::json!(10));
    }

    #[tokio::test]
    async fn transform_rejects_overlapping_segment_sets_per_course() {
        let (pipeline, _storage) = pipeline_with(vec![], true);

        let csv = "\
id,course_id,name,start_hole,end_hole,sequence
a,c1,Course A,1,9,1
b,c1,Course B,5,13,2
front,c2,Front 9,1,9,1
";
        let records = pipeline.parse_csv("sub_courses", csv.as_bytes()).unwrap();
        let output = pipeline.transform(records).await.unwrap();

        // c1's two segments bounce, c2's survives.
        assert_eq!(output.rejected.len(), 2);
        assert!(output.rejected[0].reason.contains("overlapping"));
        assert_eq!(output.tables["sub_courses"].len(), 1);
    }

    #[tokio::test]
    async fn transform_filters_holes_against_configurations() {
        let (pipeline, _storage) = pipeline_with(vec![], true);

        let mut records = pipeline.parse_csv("holes", HOLES_CSV.as_bytes()).unwrap();
        records.extend(
            pipeline
                .parse_json(
                    "configurations",
                    br#"[{"id":"front-only","course_id":"c1","name":"Front 9",
                         "sub_courses":[{"id":"front","name":"Front 9",
                                         "start_hole":1,"end_hole":9,"sequence":1}]}]"#,
                )
                .unwrap(),
        );

        let output = pipeline.transform(records).await.unwrap();

        // Hole 10 is outside every configuration.
        assert_eq!(output.tables["holes"].len(), 2);
        assert_eq!(output.rejected.len(), 1);
        assert!(output.rejected[0].reason.contains("not referenced"));
    }

    #[tokio::test]
    async fn transform_classifies_scores_against_par() {
        let (pipeline, _storage) = pipeline_with(vec![], true);

        let scores = "\
course_id,hole_number,player,strokes
c1,1,alice,3
c1,2,alice,3
c1,99,alice,4
";
        let mut records = pipeline.parse_csv("holes", HOLES_CSV.as_bytes()).unwrap();
        records.extend(pipeline.parse_csv("scores", scores.as_bytes()).unwrap());

        let output = pipeline.transform(records).await.unwrap();

        let rows = &output.tables["scores"];
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["score_class"], serde_json::json!("birdie"));
        assert_eq!(rows[0]["to_par"], serde_json::json!("-1"));
        assert_eq!(rows[1]["score_class"], serde_json::json!("par"));
        assert_eq!(rows[1]["to_par"], serde_json::json!("E"));

        // The score against an unknown hole lands in the report.
        assert_eq!(output.rejected.len(), 1);
        assert!(output.rejected[0].reason.contains("unknown hole"));
    }

    #[tokio::test]
    async fn dry_run_load_writes_report_without_posting() {
        let (pipeline, storage) = pipeline_with(vec![], true);

        let records = pipeline.parse_csv("sub_courses", SUB_COURSES_CSV.as_bytes()).unwrap();
        let output = pipeline.transform(records).await.unwrap();
        let summary = pipeline.load(output).await.unwrap();

        assert!(summary.contains("would insert 2 rows"));

        let report = storage.read_file("migration_report.json").await.unwrap();
        let report: serde_json::Value = serde_json::from_slice(&report).unwrap();
        assert_eq!(report["dry_run"], serde_json::json!(true));
        assert_eq!(report["inserted"]["sub_courses"], serde_json::json!(2));
    }
}
