//! MNIST loading from IDX files (raw or gzip-compressed) into batched matrices.
use crate::matrix::Matrix;
use anyhow::{anyhow, bail, Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use log::info;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

const IMAGE_MAGIC: i32 = 2051;
const LABEL_MAGIC: i32 = 2049;

/// Number of digit classes in MNIST.
pub const NUM_CLASSES: usize = 10;

/// Data rows paired with their label rows.
#[derive(Debug, Clone)]
pub struct Batch {
    pub data: Matrix,
    pub labels: Matrix,
}

impl Batch {
    pub fn new(data: Matrix, labels: Matrix) -> crate::Result<Self> {
        if data.rows() != labels.rows() {
            return Err(crate::Error::Dimension {
                op: "Batch::new",
                expected: (data.rows(), labels.cols()),
                actual: labels.shape(),
            });
        }
        Ok(Self { data, labels })
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.data.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One-hot encode
pub fn one_hot(label: usize, num_classes: usize) -> Vec<f64> {
    let mut v = vec![0.0; num_classes];
    if label < num_classes {
        v[label] = 1.0;
    }
    v
}

/// Image file: `items` images of `rows x cols` bytes.
#[derive(Debug)]
pub struct IdxImages {
    items: usize,
    rows: usize,
    cols: usize,
    pixels: Vec<u8>,
}

impl IdxImages {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_file(path)?;
        Self::from_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(bytes);
        let magic = r.read_i32::<BigEndian>().context("read magic")?;
        if magic != IMAGE_MAGIC {
            bail!("Invalid magic for image file: {}", magic);
        }
        let items = read_size(&mut r)?;
        let rows = read_size(&mut r)?;
        let cols = read_size(&mut r)?;
        if rows == 0 || cols == 0 {
            bail!("image dimensions must be positive, got {}x{}", rows, cols);
        }
        let needed = rows
            .checked_mul(cols)
            .and_then(|size| size.checked_mul(items))
            .ok_or_else(|| anyhow!("header size {} x {}x{} overflows", items, rows, cols))?;
        let mut pixels = Vec::new();
        r.read_to_end(&mut pixels).context("read pixels")?;
        if pixels.len() < needed {
            bail!(
                "Image data overflow: header promises {} bytes, file has {}",
                needed,
                pixels.len()
            );
        }
        pixels.truncate(needed);
        Ok(Self {
            items,
            rows,
            cols,
            pixels,
        })
    }

    /// Number of images in the file.
    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Pixels per image.
    pub fn image_size(&self) -> usize {
        self.rows * self.cols
    }

    /// `num_batches` matrices of `batch_size` images each, in file order,
    /// with pixels scaled to [0, 1].
    pub fn batches(&self, batch_size: usize, num_batches: usize) -> Result<Vec<Matrix>> {
        check_request(batch_size, num_batches, self.items)?;
        let size = self.image_size();
        let chunk_len = batch_size
            .checked_mul(size)
            .ok_or_else(|| anyhow!("batch of {} images of {} pixels overflows", batch_size, size))?;
        self.pixels
            .chunks(chunk_len)
            .take(num_batches)
            .map(|chunk| -> Result<Matrix> {
                let values = chunk.iter().map(|&b| b as f64 / 255.0).collect();
                Ok(Matrix::from_vec(batch_size, size, values)?)
            })
            .collect()
    }

    /// Every image as a single matrix.
    pub fn all(&self) -> Result<Matrix> {
        Ok(self.batches(self.items, 1)?.remove(0))
    }
}

/// Label file: one byte per item.
#[derive(Debug)]
pub struct IdxLabels {
    labels: Vec<u8>,
}

impl IdxLabels {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_file(path)?;
        Self::from_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(bytes);
        let magic = r.read_i32::<BigEndian>().context("read magic")?;
        if magic != LABEL_MAGIC {
            bail!("Invalid magic for label file: {}", magic);
        }
        let items = read_size(&mut r)?;
        let mut labels = Vec::new();
        r.read_to_end(&mut labels).context("read labels")?;
        if labels.len() < items {
            bail!(
                "Label data overflow: header promises {} labels, file has {}",
                items,
                labels.len()
            );
        }
        labels.truncate(items);
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.labels
    }

    /// `num_batches` one-hot matrices of `batch_size x num_classes`.
    pub fn batches(
        &self,
        batch_size: usize,
        num_batches: usize,
        num_classes: usize,
    ) -> Result<Vec<Matrix>> {
        check_request(batch_size, num_batches, self.labels.len())?;
        self.labels
            .chunks(batch_size)
            .take(num_batches)
            .map(|chunk| -> Result<Matrix> {
                let mut m = Matrix::new(batch_size, num_classes)?;
                for (i, &label) in chunk.iter().enumerate() {
                    let label = label as usize;
                    if label >= num_classes {
                        bail!("label {} out of range for {} classes", label, num_classes);
                    }
                    m.set_row(i, &one_hot(label, num_classes))?;
                }
                Ok(m)
            })
            .collect()
    }

    pub fn all(&self, num_classes: usize) -> Result<Matrix> {
        Ok(self.batches(self.labels.len(), 1, num_classes)?.remove(0))
    }
}

/// Which half of MNIST to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnistSplit {
    Training,
    Test,
}

impl MnistSplit {
    fn prefix(self) -> &'static str {
        match self {
            MnistSplit::Training => "train",
            MnistSplit::Test => "t10k",
        }
    }

    pub fn images_file(self) -> String {
        format!("{}-images-idx3-ubyte", self.prefix())
    }

    pub fn labels_file(self) -> String {
        format!("{}-labels-idx1-ubyte", self.prefix())
    }
}

/// Load `num_batches` batches of `batch_size` examples from `dir`.
pub fn load_batches<P: AsRef<Path>>(
    dir: P,
    split: MnistSplit,
    batch_size: usize,
    num_batches: usize,
) -> Result<Vec<Batch>> {
    let (images, labels) = open_split(dir.as_ref(), split)?;
    let data = images.batches(batch_size, num_batches)?;
    let targets = labels.batches(batch_size, num_batches, NUM_CLASSES)?;
    info!(
        "loaded {} {:?} batches of {} examples",
        data.len(),
        split,
        batch_size
    );
    data.into_iter()
        .zip(targets)
        .map(|(d, l)| -> Result<Batch> { Ok(Batch::new(d, l)?) })
        .collect()
}

/// Load the whole split as a single batch.
pub fn load_all<P: AsRef<Path>>(dir: P, split: MnistSplit) -> Result<Batch> {
    let (images, labels) = open_split(dir.as_ref(), split)?;
    if images.len() != labels.len() {
        bail!(
            "{:?} split has {} images but {} labels",
            split,
            images.len(),
            labels.len()
        );
    }
    info!("loaded {:?} split: {} examples", split, images.len());
    Ok(Batch::new(images.all()?, labels.all(NUM_CLASSES)?)?)
}

fn open_split(dir: &Path, split: MnistSplit) -> Result<(IdxImages, IdxLabels)> {
    let images = IdxImages::open(resolve(dir, &split.images_file())?)?;
    let labels = IdxLabels::open(resolve(dir, &split.labels_file())?)?;
    Ok((images, labels))
}

/// `dir/name`, falling back to `dir/name.gz`.
fn resolve(dir: &Path, name: &str) -> Result<PathBuf> {
    let raw = dir.join(name);
    if raw.exists() {
        return Ok(raw);
    }
    let gz = dir.join(format!("{}.gz", name));
    if gz.exists() {
        return Ok(gz);
    }
    Err(anyhow!("Neither {} nor {} found", raw.display(), gz.display()))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut contents = Vec::new();
    if path.extension().map_or(false, |ext| ext == "gz") {
        GzDecoder::new(file)
            .read_to_end(&mut contents)
            .with_context(|| format!("Gzip read error in {}", path.display()))?;
    } else {
        let mut file = file;
        file.read_to_end(&mut contents)
            .with_context(|| format!("Read error in {}", path.display()))?;
    }
    Ok(contents)
}

fn read_size(r: &mut Cursor<&[u8]>) -> Result<usize> {
    let v = r.read_i32::<BigEndian>().context("read header")?;
    usize::try_from(v).map_err(|_| anyhow!("negative size {} in header", v))
}

fn check_request(batch_size: usize, num_batches: usize, items: usize) -> Result<()> {
    if batch_size < 1 || num_batches < 1 {
        bail!("batch size and number of batches must be at least one");
    }
    let requested = batch_size
        .checked_mul(num_batches)
        .ok_or_else(|| anyhow!("{} x {} records overflows", num_batches, batch_size))?;
    if requested > items {
        bail!(
            "requested {} x {} records but the file holds {}",
            num_batches,
            batch_size,
            items
        );
    }
    Ok(())
}
