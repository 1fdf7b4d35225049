//! Pulls whole JPEG images out of a chunked `multipart/x-mixed-replace` body.

const START_OF_IMAGE: [u8; 2] = [0xFF, 0xD8];
const END_OF_IMAGE: [u8; 2] = [0xFF, 0xD9];
pub const DEFAULT_BUFFER_LIMIT: usize = 4 * 1024 * 1024;

pub struct MjpegFrameExtractor {
    pending: Vec<u8>,
    limit: usize,
    frames_seen: u64,
    // where the end-marker search resumes while `pending` holds a partial image
    resume_at: usize,
}

impl MjpegFrameExtractor {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_BUFFER_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit,
            frames_seen: 0,
            resume_at: 0,
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Feeds `chunk` and returns the newest image it completed, if any.
    /// Older images completed by the same chunk are dropped.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        if self.pending.len() > self.limit {
            let excess = self.pending.len() - self.limit;
            self.pending.drain(..excess);
            self.resume_at = 0;
        }

        let mut newest = None;
        loop {
            match self.next_image() {
                Scan::Image(image) => {
                    self.frames_seen += 1;
                    newest = Some(image);
                }
                Scan::Partial | Scan::Empty => return newest,
            }
        }
    }

    fn next_image(&mut self) -> Scan {
        let Some(start) = position_of(&self.pending, START_OF_IMAGE) else {
            // only multipart headers or garbage remain; a trailing 0xFF may open the next image
            let keep = usize::from(self.pending.last() == Some(&START_OF_IMAGE[0]));
            self.pending.drain(..self.pending.len() - keep);
            self.resume_at = 0;
            return Scan::Empty;
        };

        let from = self.resume_at.max(start + START_OF_IMAGE.len());
        match position_of(&self.pending[from..], END_OF_IMAGE) {
            Some(end) => {
                let stop = from + end + END_OF_IMAGE.len();
                let image = self.pending[start..stop].to_vec();
                self.pending.drain(..stop);
                self.resume_at = 0;
                Scan::Image(image)
            }
            None => {
                self.pending.drain(..start);
                // the last byte may be the first half of a split end marker
                self.resume_at = (self.pending.len() - 1).max(START_OF_IMAGE.len());
                Scan::Partial
            }
        }
    }
}

enum Scan {
    Image(Vec<u8>),
    Partial,
    Empty,
}

impl Default for MjpegFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn position_of(haystack: &[u8], marker: [u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|pair| pair == marker)
}

#[cfg(test)]
mod tests {
    use super::MjpegFrameExtractor;

    fn jpeg(payload: &[u8]) -> Vec<u8> {
        let mut image = vec![0xFF, 0xD8];
        image.extend_from_slice(payload);
        image.extend_from_slice(&[0xFF, 0xD9]);
        image
    }

    fn part(image: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--frame\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
            image.len()
        )
        .into_bytes();
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
        body
    }

    #[test]
    fn finds_image_inside_multipart_part() {
        let image = jpeg(b"pixels");
        let mut extractor = MjpegFrameExtractor::new();

        let frame = extractor.feed(&part(&image)).expect("frame should be found");
        assert_eq!(frame, image);
        assert_eq!(extractor.frames_seen(), 1);
    }

    #[test]
    fn reassembles_image_split_across_chunks() {
        let image = jpeg(b"split-across-reads");
        let body = part(&image);
        let mut extractor = MjpegFrameExtractor::new();

        let (head, tail) = body.split_at(body.len() / 2);
        assert!(extractor.feed(head).is_none());
        assert_eq!(extractor.feed(tail), Some(image));
    }

    #[test]
    fn marker_split_on_chunk_boundary_is_kept() {
        let image = jpeg(b"abc");
        let mut extractor = MjpegFrameExtractor::new();

        assert!(extractor.feed(b"--frame\r\n\r\n\xFF").is_none());
        assert_eq!(extractor.feed(&image[1..]), Some(image));
    }

    #[test]
    fn returns_newest_of_several_images() {
        let mut body = part(&jpeg(b"old"));
        body.extend_from_slice(&part(&jpeg(b"new")));
        let mut extractor = MjpegFrameExtractor::new();

        assert_eq!(extractor.feed(&body), Some(jpeg(b"new")));
        assert_eq!(extractor.frames_seen(), 2);
    }

    #[test]
    fn keep_alive_boundaries_yield_nothing() {
        let mut extractor = MjpegFrameExtractor::with_limit(64);
        for _ in 0..100 {
            assert!(extractor.feed(b"--frame\r\n\r\n").is_none());
        }
        assert_eq!(extractor.frames_seen(), 0);
    }

    #[test]
    fn byte_at_a_time_feed_finds_split_end_marker() {
        let image = jpeg(&[0x11; 4096]);
        let body = part(&image);
        let mut extractor = MjpegFrameExtractor::new();

        let mut found = Vec::new();
        for byte in &body {
            found.extend(extractor.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(found, vec![image]);
        assert_eq!(extractor.frames_seen(), 1);
    }

    #[test]
    fn partial_image_survives_until_its_end_marker() {
        let mut extractor = MjpegFrameExtractor::new();

        assert!(extractor.feed(b"\xFF\xD8head\xFF").is_none());
        assert!(extractor.feed(b"\x00more").is_none());
        assert!(extractor.feed(b"\xFF").is_none());
        assert_eq!(
            extractor.feed(b"\xD9--frame"),
            Some(b"\xFF\xD8head\xFF\x00more\xFF\xD9".to_vec())
        );
    }
}
