use std::cell::RefCell;
use std::fmt;
use std::io::Read;
use std::rc::Rc;
use crate::Result;


enum Source {
    Pending(Box<dyn Read>),
    Buffered(Rc<str>),
}

/// Replayable template text.
///
/// A one-shot source is read completely the first time the text is needed
/// and the buffered copy serves every later request, so clones of a model
/// and repeated includes all see the same characters.
#[derive(Clone)]
pub(crate) struct Content(Rc<RefCell<Source>>);

impl Content {
    pub(crate) fn from_text(text: &str) -> Self {
        Content(Rc::new(RefCell::new(Source::Buffered(Rc::from(text)))))
    }

    pub(crate) fn from_reader<R: Read + 'static>(reader: R) -> Self {
        Content(Rc::new(RefCell::new(Source::Pending(Box::new(reader)))))
    }

    pub(crate) fn text(&self) -> Result<Rc<str>> {
        let mut source = self.0.borrow_mut();
        let text: Rc<str> = match &mut *source {
            Source::Buffered(text) => return Ok(Rc::clone(text)),
            Source::Pending(reader) => {
                let mut text = String::new();
                reader.read_to_string(&mut text)?;
                Rc::from(text)
            }
        };
        *source = Source::Buffered(Rc::clone(&text));
        Ok(text)
    }

    /// A fresh reader positioned at the start of the text.
    pub(crate) fn reader(&self) -> Result<Reader> {
        Ok(Reader::new(self.text()?))
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.borrow() {
            Source::Pending(_) => write!(f, "Content(<pending>)"),
            Source::Buffered(text) => write!(f, "Content({} bytes)", text.len()),
        }
    }
}


/// Character cursor over buffered template text.
///
/// Nested blocks of the same model share one reader so that each character
/// is consumed exactly once.
#[derive(Debug)]
pub(crate) struct Reader {
    input: Rc<str>,
    pos: usize,
}

impl Reader {
    pub(crate) fn new(input: Rc<str>) -> Self {
        Reader { input, pos: 0 }
    }

    pub(crate) fn pop_front(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}
