use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

use crate::fusion::domain::annotation_style::{
    outline_corners, resolve_style, Color, BOX_THICKNESS, FACE_BOX_COLOR, HEAD_BOX_COLOR,
};
use crate::fusion::domain::correlated_triple::CorrelatedTriple;
use crate::fusion::domain::frame_annotator::{AnnotationError, FrameAnnotator};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

const CAPTION_FONT: i32 = imgproc::FONT_HERSHEY_PLAIN;
const CAPTION_SCALE: f64 = 2.0;
const CAPTION_THICKNESS: i32 = 2;

/// Draws detections and recognitions onto a copy of the image with
/// OpenCV's raster primitives.
///
/// Layers, bottom to top: head boxes, face boxes composed into frame
/// coordinates, recognition boxes with captions.
pub struct RasterAnnotator {
    thickness: i32,
    caption_scale: f64,
}

impl RasterAnnotator {
    pub fn new() -> Self {
        Self {
            thickness: BOX_THICKNESS,
            caption_scale: CAPTION_SCALE,
        }
    }

    fn render(&self, canvas: &mut Mat, triple: &CorrelatedTriple) -> opencv::Result<()> {
        let heads = &triple.detections.head_detections;
        for head in heads {
            self.draw_box(canvas, head.head_detection, HEAD_BOX_COLOR)?;
        }
        for face in heads.iter().flat_map(|h| h.global_faces()) {
            self.draw_box(canvas, face, FACE_BOX_COLOR)?;
        }
        for recognition in &triple.recognitions.detections {
            let style = resolve_style(recognition);
            self.draw_box(canvas, recognition.roi, style.box_color)?;
            self.draw_caption(canvas, style.caption, style.caption_origin, style.caption_color)?;
        }
        Ok(())
    }

    fn draw_box(&self, canvas: &mut Mat, region: Region, color: Color) -> opencv::Result<()> {
        let (width, height) = (canvas.cols() as u32, canvas.rows() as u32);
        let Some([(x1, y1), (x2, y2)]) = outline_corners(region, width, height) else {
            return Ok(());
        };
        imgproc::rectangle_points(
            canvas,
            Point::new(x1, y1),
            Point::new(x2, y2),
            scalar(color),
            self.thickness,
            imgproc::LINE_8,
            0,
        )
    }

    /// Draws `text` with its baseline starting at `origin`. Captions that
    /// cannot touch the canvas are skipped.
    fn draw_caption(
        &self,
        canvas: &mut Mat,
        text: &str,
        origin: (i64, i64),
        color: Color,
    ) -> opencv::Result<()> {
        let mut baseline = 0;
        let size = imgproc::get_text_size(
            text,
            CAPTION_FONT,
            self.caption_scale,
            CAPTION_THICKNESS,
            &mut baseline,
        )?;
        let (x, y) = origin;
        let below = (baseline + CAPTION_THICKNESS) as i64;
        let visible = x < canvas.cols() as i64
            && x + size.width as i64 > 0
            && y - (size.height as i64) < canvas.rows() as i64
            && y + below > 0;
        if !visible {
            return Ok(());
        }
        // bounded by the canvas size on both sides, so both fit i32
        imgproc::put_text(
            canvas,
            text,
            Point::new(x as i32, y as i32),
            CAPTION_FONT,
            self.caption_scale,
            scalar(color),
            CAPTION_THICKNESS,
            imgproc::LINE_8,
            false,
        )
    }
}

impl Default for RasterAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAnnotator for RasterAnnotator {
    fn annotate(&self, triple: &CorrelatedTriple) -> Result<Frame, AnnotationError> {
        let frame = triple.image.to_frame()?;
        let stamp = frame.stamp();
        let mut canvas = frame.to_mat().map_err(render_error)?;
        self.render(&mut canvas, triple).map_err(render_error)?;
        let annotated = Frame::from_mat(&canvas, stamp).map_err(render_error)?;

        log::trace!(
            "Annotated frame {stamp}: {} heads, {} recognitions",
            triple.detections.head_detections.len(),
            triple.recognitions.detections.len()
        );
        Ok(annotated)
    }
}

/// Canvases hold RGB pixels, so the channels map one to one.
fn scalar(color: Color) -> Scalar {
    let [r, g, b] = color.0;
    Scalar::new(r as f64, g as f64, b as f64, 0.0)
}

fn render_error(e: opencv::Error) -> AnnotationError {
    AnnotationError::Render(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::domain::annotation_style::{
        ALERT_CAPTION_COLOR, FACE_RECOGNITION_COLOR, HEAD_RECOGNITION_COLOR, IDENTITY_CAPTION_COLOR,
    };
    use crate::fusion::domain::messages::{
        DetectionArray, HeadDetection, ImageMessage, Recognition, RecognitionArray,
    };
    use crate::shared::timestamp::Timestamp;

    const GRAY: [u8; 3] = [40, 40, 40];

    fn gray_image(width: u32, height: u32) -> ImageMessage {
        let stamp = Timestamp::from_secs_f64(2.0);
        let data = GRAY.repeat((width * height) as usize);
        ImageMessage::from_frame(&Frame::new(data, width, height, 3, stamp))
    }

    fn triple_on(image: ImageMessage, heads: Vec<HeadDetection>, recognitions: Vec<Recognition>) -> CorrelatedTriple {
        let stamp = image.stamp;
        CorrelatedTriple::new(
            RecognitionArray {
                stamp,
                detections: recognitions,
            },
            DetectionArray {
                stamp,
                head_detections: heads,
            },
            image,
        )
    }

    fn triple(heads: Vec<HeadDetection>, recognitions: Vec<Recognition>) -> CorrelatedTriple {
        triple_on(gray_image(160, 160), heads, recognitions)
    }

    fn plain(t: &CorrelatedTriple) -> Frame {
        t.image.to_frame().unwrap()
    }

    fn canvas(t: &CorrelatedTriple) -> Mat {
        plain(t).to_mat().unwrap()
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    fn count_color(frame: &Frame, color: Color, area: Region) -> usize {
        (area.y..area.bottom())
            .flat_map(|y| (area.x..area.right()).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(frame, x as u32, y as u32) == color.0)
            .count()
    }

    fn assert_rows_equal(a: &Frame, b: &Frame, rows: std::ops::Range<u32>) {
        for y in rows {
            for x in 0..a.width() {
                assert_eq!(pixel(a, x, y), pixel(b, x, y), "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_empty_triple_yields_copy_of_image() {
        let t = triple(Vec::new(), Vec::new());
        let out = RasterAnnotator::new().annotate(&t).unwrap();
        assert_eq!(out, plain(&t));
        assert_eq!(out.stamp(), Timestamp::from_secs_f64(2.0));
    }

    #[test]
    fn test_head_and_composed_face_boxes() {
        let head = HeadDetection::new(Region::new(10, 20, 50, 50), vec![Region::new(5, 5, 20, 20)]);
        let out = RasterAnnotator::new().annotate(&triple(vec![head], Vec::new())).unwrap();

        assert_eq!(pixel(&out, 10, 20), HEAD_BOX_COLOR.0);
        assert_eq!(pixel(&out, 60, 70), HEAD_BOX_COLOR.0);
        assert_eq!(pixel(&out, 35, 20), HEAD_BOX_COLOR.0);
        // face composed to (15, 25, 20, 20)
        assert_eq!(pixel(&out, 15, 25), FACE_BOX_COLOR.0);
        assert_eq!(pixel(&out, 35, 45), FACE_BOX_COLOR.0);
        assert_eq!(pixel(&out, 25, 35), GRAY);
        assert_eq!(pixel(&out, 48, 58), GRAY);
    }

    #[test]
    fn test_head_without_faces_still_drawn() {
        let head = HeadDetection::new(Region::new(30, 30, 40, 40), Vec::new());
        let out = RasterAnnotator::new().annotate(&triple(vec![head], Vec::new())).unwrap();
        assert_eq!(pixel(&out, 30, 30), HEAD_BOX_COLOR.0);
        assert_eq!(count_color(&out, FACE_BOX_COLOR, Region::new(0, 0, 160, 160)), 0);
    }

    #[test]
    fn test_no_recognitions_equals_detection_layers_alone() {
        let head = HeadDetection::new(Region::new(10, 20, 50, 50), vec![Region::new(5, 5, 20, 20)]);
        let t = triple(vec![head], Vec::new());
        let annotator = RasterAnnotator::new();

        let mut expected = canvas(&t);
        annotator.draw_box(&mut expected, Region::new(10, 20, 50, 50), HEAD_BOX_COLOR).unwrap();
        annotator.draw_box(&mut expected, Region::new(15, 25, 20, 20), FACE_BOX_COLOR).unwrap();
        let expected = Frame::from_mat(&expected, t.image.stamp).unwrap();

        assert_eq!(annotator.annotate(&t).unwrap(), expected);
    }

    #[test]
    fn test_recognition_drawn_over_detections() {
        let roi = Region::new(20, 20, 40, 40);
        let head = HeadDetection::new(roi, Vec::new());
        let rec = Recognition::new(roi, "face", "alice");
        let out = RasterAnnotator::new().annotate(&triple(vec![head], vec![rec])).unwrap();
        assert_eq!(pixel(&out, 20, 20), FACE_RECOGNITION_COLOR.0);
    }

    #[test]
    fn test_head_detector_uses_head_color() {
        let rec = Recognition::new(Region::new(20, 20, 40, 40), "head", "alice");
        let out = RasterAnnotator::new().annotate(&triple(Vec::new(), vec![rec])).unwrap();
        assert_eq!(pixel(&out, 20, 20), HEAD_RECOGNITION_COLOR.0);
    }

    #[test]
    fn test_caption_colors_follow_label() {
        // box bottom edge ends near row 61; captions sit lower
        let caption_area = Region::new(0, 63, 160, 97);
        let roi = Region::new(20, 20, 40, 40);
        let annotator = RasterAnnotator::new();

        let unknown = Recognition::new(roi, "head", "Unknown");
        let out = annotator.annotate(&triple(Vec::new(), vec![unknown])).unwrap();
        assert!(count_color(&out, ALERT_CAPTION_COLOR, caption_area) > 0);

        let named = Recognition::new(roi, "head", "alice");
        let out = annotator.annotate(&triple(Vec::new(), vec![named])).unwrap();
        assert_eq!(count_color(&out, ALERT_CAPTION_COLOR, caption_area), 0);
        assert!(count_color(&out, IDENTITY_CAPTION_COLOR, caption_area) > 0);
    }

    #[test]
    fn test_no_face_caption_rendered_in_alert_color() {
        let roi = Region::new(10, 10, 30, 30);
        let t = triple(Vec::new(), vec![Recognition::new(roi, "head", "No face")]);
        let out = RasterAnnotator::new().annotate(&t).unwrap();

        let mut expected = canvas(&t);
        imgproc::put_text(
            &mut expected,
            "No face",
            Point::new(10, 65),
            imgproc::FONT_HERSHEY_PLAIN,
            2.0,
            Scalar::new(255.0, 0.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )
        .unwrap();
        let expected = Frame::from_mat(&expected, t.image.stamp).unwrap();

        assert!(count_color(&out, ALERT_CAPTION_COLOR, Region::new(0, 45, 160, 35)) > 0);
        assert_rows_equal(&out, &expected, 45..80);
    }

    #[test]
    fn test_unknown_caption_independent_of_detector() {
        let annotator = RasterAnnotator::new();
        let roi = Region::new(20, 20, 40, 40);
        let by_head = annotator
            .annotate(&triple(Vec::new(), vec![Recognition::new(roi, "head", "Unknown")]))
            .unwrap();
        let by_face = annotator
            .annotate(&triple(Vec::new(), vec![Recognition::new(roi, "face", "Unknown")]))
            .unwrap();
        assert_rows_equal(&by_head, &by_face, 63..160);
        assert_ne!(pixel(&by_head, 20, 20), pixel(&by_face, 20, 20));
    }

    #[test]
    fn test_caption_text_matches_label() {
        let roi = Region::new(10, 10, 30, 30);
        let t = triple(Vec::new(), vec![Recognition::new(roi, "face", "Bob")]);
        let out = RasterAnnotator::new().annotate(&t).unwrap();

        let mut expected = canvas(&t);
        imgproc::put_text(
            &mut expected,
            "Bob",
            Point::new(10, 65),
            imgproc::FONT_HERSHEY_PLAIN,
            2.0,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )
        .unwrap();
        let expected = Frame::from_mat(&expected, t.image.stamp).unwrap();
        assert_rows_equal(&out, &expected, 45..80);
    }

    #[test]
    fn test_caption_keeps_letter_case() {
        let roi = Region::new(10, 10, 30, 30);
        let annotator = RasterAnnotator::new();
        let lower = annotator
            .annotate(&triple(Vec::new(), vec![Recognition::new(roi, "face", "bob")]))
            .unwrap();
        let upper = annotator
            .annotate(&triple(Vec::new(), vec![Recognition::new(roi, "face", "BOB")]))
            .unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_annotation_is_deterministic_and_leaves_input_untouched() {
        let head = HeadDetection::new(Region::new(10, 10, 50, 50), vec![Region::new(5, 5, 20, 20)]);
        let rec = Recognition::new(Region::new(15, 15, 20, 20), "face", "Unknown");
        let t = triple(vec![head], vec![rec]);
        let before = t.image.clone();
        let annotator = RasterAnnotator::new();
        let a = annotator.annotate(&t).unwrap();
        let b = annotator.annotate(&t).unwrap();
        assert_eq!(a, b);
        assert_eq!(t.image, before);
    }

    #[test]
    fn test_regions_outside_frame_are_clipped() {
        let head = HeadDetection::new(Region::new(-20, -20, 400, 400), vec![Region::new(0, 0, 10, 10)]);
        let rec = Recognition::new(Region::new(150, 150, 40, 40), "face", "alice");
        assert!(RasterAnnotator::new().annotate(&triple(vec![head], vec![rec])).is_ok());
    }

    #[test]
    fn test_recognition_at_coordinate_limit_is_skipped() {
        let rec = Recognition::new(Region::new(10, i32::MAX - 5, 20, 20), "face", "alice");
        let t = triple(Vec::new(), vec![rec]);
        assert_eq!(RasterAnnotator::new().annotate(&t).unwrap(), plain(&t));
    }

    #[test]
    fn test_face_composed_past_coordinate_limit_is_skipped() {
        let head = HeadDetection::new(Region::new(i32::MAX - 10, 0, 50, 50), vec![Region::new(20, 5, 10, 10)]);
        let t = triple(vec![head], Vec::new());
        assert_eq!(RasterAnnotator::new().annotate(&t).unwrap(), plain(&t));
    }

    #[test]
    fn test_huge_box_is_drawn_clipped() {
        let t = triple_on(
            gray_image(64, 64),
            Vec::new(),
            vec![Recognition::new(Region::new(10, 10, 200_000_000, 200_000_000), "head", "Unknown")],
        );
        let out = RasterAnnotator::new().annotate(&t).unwrap();
        assert_eq!(pixel(&out, 10, 10), HEAD_RECOGNITION_COLOR.0);
        assert_eq!(pixel(&out, 10, 63), HEAD_RECOGNITION_COLOR.0);
        assert_eq!(pixel(&out, 63, 10), HEAD_RECOGNITION_COLOR.0);
        assert_eq!(pixel(&out, 40, 40), GRAY);
    }

    #[test]
    fn test_box_around_whole_frame_draws_nothing() {
        let t = triple_on(
            gray_image(64, 64),
            Vec::new(),
            vec![Recognition::new(
                Region::new(-100_000_000, -100_000_000, 200_000_000, 200_000_000),
                "head",
                "Unknown",
            )],
        );
        assert_eq!(RasterAnnotator::new().annotate(&t).unwrap(), plain(&t));
    }

    #[test]
    fn test_undecodable_image_is_an_error() {
        let mut t = triple(Vec::new(), Vec::new());
        t.image.encoding = "yuv422".into();
        let err = RasterAnnotator::new().annotate(&t).unwrap_err();
        assert!(matches!(err, AnnotationError::Decode(_)));
    }
}
