//! Forwarding helpers shared by the producing operators.

use lazyseq_runtime::{Result, Seq, SeqIter, Sink};

/// Emit everything `iter` has left.
pub(crate) fn forward_rest<T>(iter: &mut SeqIter<T>, sink: &mut Sink<'_, T>) -> Result<()> {
    while iter.advance()? {
        if let Some(item) = iter.take_current() {
            sink.emit(item);
        }
    }
    Ok(())
}

/// Enumerate `source` from the start and emit every element.
pub(crate) fn forward_all<T: 'static>(source: &Seq<T>, sink: &mut Sink<'_, T>) -> Result<()> {
    let mut iter = source.get_iterator()?;
    forward_rest(&mut iter, sink)
}
