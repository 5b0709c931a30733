//! End-to-end tests: title log and ground truth on disk through to a score.

use byteorder::{LittleEndian, WriteBytesExt};
use std::path::PathBuf;
use task_summarizer::{
    build_bags, bucket_titles, collapse_runs,
    core::load_title_log,
    embedding::{EmbeddingFormat, EmbeddingTable, Word2VecTable},
    eval::load_ground_truth,
    AlignError, Aligner, CentroidClusterer, Clusterer, PredictedSegment, TitleCleaner, WindowBag,
};
use uuid::Uuid;

const TITLE_LOG: &str = "start,end,app,title\n\
                         0,9,chrome,Cats and dogs\n\
                         9,18,chrome,Cats\n\
                         18,27,chrome,Dogs\n\
                         27,38,acrobat,Tax forms\n\
                         38,58,acrobat,Tax invoice\n";

const GROUND_TRUTH: &str = "start,end,label\n\
                            0:00:00,0:00:20,1\n\
                            not-a-time,0:00:30,9\n\
                            0:00:20,0:01:00,2\n";

const EMBEDDINGS: &str = "cat 1 0\n\
                          dog 0.9 0.1\n\
                          tax 0 1\n\
                          form 0.1 0.9\n\
                          invoic 0.05 0.95\n\
                          invoice 0.05 0.95\n";

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("task-summarizer-it-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn write(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Assigns task ids from a fixed list.
struct Scripted(Vec<usize>);

impl Clusterer for Scripted {
    fn cluster(&mut self, bags: Vec<WindowBag>) -> Vec<PredictedSegment> {
        bags.into_iter()
            .zip(self.0.iter().copied())
            .map(|(bag, task_id)| PredictedSegment::new(bag, task_id))
            .collect()
    }
}

fn load_segments(fixture: &Fixture) -> (Vec<WindowBag>, Word2VecTable) {
    let titles = fixture.write("titles.csv", TITLE_LOG.as_bytes());
    let vectors = fixture.write("vectors.txt", EMBEDDINGS.as_bytes());

    let log = load_title_log(&titles).unwrap();
    assert!(log.is_clean());
    let windows = bucket_titles(&log.records, 10);
    assert_eq!(windows.len(), 6);

    let table = Word2VecTable::load(&vectors, EmbeddingFormat::from_path(&vectors)).unwrap();
    let summary = build_bags(&windows, 1.0, 3, &TitleCleaner::default(), &table).unwrap();
    assert!(summary.dropped.is_empty());
    (summary.bags, table)
}

#[test]
fn test_end_to_end_scoring() {
    let fixture = Fixture::new();
    let (bags, table) = load_segments(&fixture);

    let truth_path = fixture.write("truth.txt", GROUND_TRUTH.as_bytes());
    let truth = load_ground_truth(&truth_path).unwrap();
    assert_eq!(truth.records.len(), 2);
    assert_eq!(truth.skipped.len(), 1);
    assert_eq!(truth.skipped[0].line, 3);

    let segments = Scripted(vec![0, 0, 1, 1, 1, 1]).cluster(bags);
    let report = Aligner::new(10)
        .evaluate(&segments, &truth.records)
        .unwrap();

    assert_eq!(report.accuracy, 1.0);
    assert_eq!(report.intervals[0].scored_windows, 2);
    // [20, 30) falls on the boundary step
    assert_eq!(report.intervals[1].scored_windows, 3);

    let tasks = collapse_runs(segments, &table).unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].interval().start, 0);
    assert_eq!(tasks[0].interval().end, 20);
    assert_eq!(tasks[1].interval().end, 60);
    assert_eq!(tasks[1].bag.count("tax"), Some(5));
}

#[test]
fn test_centroid_clusterer_separates_topics() {
    let fixture = Fixture::new();
    let (bags, _) = load_segments(&fixture);

    assert_eq!(bags[0].count("cat"), Some(2));
    assert_eq!(bags[0].count("dog"), Some(1));

    let segments = CentroidClusterer::new(0.8).cluster(bags);
    let ids: Vec<usize> = segments.iter().map(|s| s.task_id).collect();
    assert_eq!(ids, vec![0, 0, 1, 1, 1, 1]);
}

#[test]
fn test_mismatched_time_origin_reports_no_overlap() {
    let fixture = Fixture::new();
    let (bags, _) = load_segments(&fixture);
    let segments = Scripted(vec![0; 6]).cluster(bags);

    // ground truth ends before the first predicted window does
    let truth_path = fixture.write("truth.txt", b"start,end,label\n0:00:00,0:00:05,1\n");
    let truth = load_ground_truth(&truth_path).unwrap();

    let err = Aligner::new(10)
        .evaluate(&segments, &truth.records)
        .unwrap_err();
    assert_eq!(err, AlignError::NoOverlap);
}

#[test]
fn test_binary_embeddings_from_disk() {
    let fixture = Fixture::new();
    let mut bytes = b"2 3\n".to_vec();
    for (word, vector) in [("cat", [1.0f32, 0.0, 0.5]), ("dog", [0.0, 1.0, 0.5])] {
        bytes.extend_from_slice(word.as_bytes());
        bytes.push(b' ');
        for v in vector {
            bytes.write_f32::<LittleEndian>(v).unwrap();
        }
        bytes.push(b'\n');
    }
    let path = fixture.write("vectors.bin", &bytes);

    let table = Word2VecTable::load(&path, EmbeddingFormat::from_path(&path)).unwrap();
    assert_eq!(table.dimensions(), 3);
    assert_eq!(table.embed("cat"), Some(&[1.0, 0.0, 0.5][..]));
}
