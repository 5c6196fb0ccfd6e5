use std::path::Path;
use std::sync::Arc;

use imgfleet_core::{RunStatistics, WorkerId};
use imgfleet_dispatcher::{BlurExclusionPolicy, Coordinator, DispatcherService, FileList};
use imgfleet_imaging::{Bitmap, ImageGeometry, KernelSize};
use imgfleet_infrastructure::coordinator_channel;
use imgfleet_worker::{BlurFilterExecutor, LightFilterExecutor, WorkerService};

fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> usize {
    let geometry = ImageGeometry::new(width as usize, height as usize);
    let pixels = (0..geometry.image_byte_size()).map(|i| (i * 7 % 256) as u8).collect();
    Bitmap::from_pixels(width, height, pixels)
        .unwrap()
        .save(dir.join(name))
        .unwrap();
    geometry.image_byte_size()
}

#[tokio::test]
async fn light_executor_writes_five_outputs() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let size = write_image(input_dir.path(), "cat.bmp", 5, 3);

    let executor = LightFilterExecutor::new(output_dir.path());
    let task = imgfleet_core::Task::light(input_dir.path().join("cat.bmp").to_string_lossy());
    let stats = imgfleet_core::TaskExecutor::execute(&executor, &task).await.unwrap();

    assert_eq!(stats, RunStatistics::new(size as u64, 5 * size as u64, 5));
    for suffix in ["grayscale", "mirrorh", "mirrorv", "gray_mirrorh", "gray_mirrorv"] {
        let output = output_dir.path().join(format!("cat_{suffix}.bmp"));
        let bitmap = Bitmap::open(&output).unwrap();
        assert_eq!(bitmap.geometry.width, 5);
        assert_eq!(bitmap.geometry.height, 3);
    }
}

#[tokio::test]
async fn blur_executor_embeds_kernel_in_name() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let size = write_image(input_dir.path(), "dog.bmp", 4, 4);

    let executor = BlurFilterExecutor::new(output_dir.path(), KernelSize::new(57).unwrap());
    let task = imgfleet_core::Task::blur(input_dir.path().join("dog.bmp").to_string_lossy());
    let stats = imgfleet_core::TaskExecutor::execute(&executor, &task).await.unwrap();

    assert_eq!(stats, RunStatistics::new(size as u64, size as u64, 1));
    assert!(output_dir.path().join("dog_blur_57.bmp").exists());
}

#[tokio::test]
async fn workers_process_every_file_through_the_coordinator() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let mut total_size = 0;
    for (i, name) in ["a.bmp", "b.bmp", "c.bmp"].iter().enumerate() {
        total_size += write_image(input_dir.path(), name, 3 + i as u32, 2) as u64;
    }
    // 损坏的输入：任务被消费但不计入统计
    std::fs::write(input_dir.path().join("d.bmp"), b"BM").unwrap();

    let files = FileList::discover(input_dir.path(), 600, 4096).unwrap();
    assert_eq!(files.len(), 4);
    let roster = vec![WorkerId::new("1"), WorkerId::new("10")];
    let coordinator =
        Coordinator::new(files, roster.clone(), BlurExclusionPolicy::new(["10"]), 128).unwrap();

    let (channel, receiver) = coordinator_channel(16);
    let dispatcher = tokio::spawn(DispatcherService::new(coordinator).run(receiver));

    let kernel = KernelSize::new(55).unwrap();
    let mut handles = Vec::new();
    for worker_id in roster {
        let worker = WorkerService::builder(worker_id, Arc::new(channel.clone()))
            .with_image_executors(output_dir.path(), kernel)
            .build()
            .await
            .unwrap();
        handles.push(tokio::spawn(async move { worker.run().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let report = dispatcher.await.unwrap().unwrap();
    assert_eq!(report.images_generated, 3 * 5 + 3);
    assert_eq!(report.bytes_read, 2 * total_size);
    assert_eq!(report.bytes_written, 6 * total_size);

    for stem in ["a", "b", "c"] {
        assert!(output_dir.path().join(format!("{stem}_grayscale.bmp")).exists());
        assert!(output_dir.path().join(format!("{stem}_blur_55.bmp")).exists());
    }
}
